use crate::error::{TbError, TbResult};
use crate::sim_if::{sim, ObjectKind};
use crate::trigger::Trigger;
use crate::value::LogicVec;

/// Read-only handle to an object of the simulated design.
///
/// A `SimObject` can be copied freely and read by anyone. Writing requires a
/// [`Driver`], obtained through [`SimObject::drive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimObject {
    pub(crate) handle: usize,
    pub(crate) kind: ObjectKind,
}

impl SimObject {
    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> TbResult<String> {
        sim()?.get_full_name(self.handle)
    }

    /// Bit width, 0 for hierarchy scopes.
    pub fn width(&self) -> u32 {
        match self.kind {
            ObjectKind::Signal(width) => width,
            ObjectKind::Hier => 0,
        }
    }

    pub fn get_root() -> TbResult<Self> {
        let sim = sim()?;
        let handle = sim.get_root_handle()?;
        Ok(SimObject {
            handle,
            kind: sim.get_kind(handle)?,
        })
    }

    pub fn from_name(full_name: &str) -> TbResult<Self> {
        let sim = sim()?;
        let handle = sim.get_handle_by_name(full_name)?;
        Ok(SimObject {
            handle,
            kind: sim.get_kind(handle)?,
        })
    }

    pub fn get_child(&self, name: &str) -> TbResult<Self> {
        let mut child_name = self.name()?;
        child_name.push('.');
        child_name.push_str(name);
        SimObject::from_name(&child_name)
    }

    /// Short form of [`get_child`](Self::get_child).
    pub fn c(&self, name: &str) -> TbResult<Self> {
        self.get_child(name)
    }

    pub fn value(&self) -> TbResult<LogicVec> {
        sim()?.get_value(self.handle)
    }

    /// Integer value, `None` if any bit is `X` or `Z`.
    pub fn u64(&self) -> TbResult<Option<u64>> {
        Ok(self.value()?.to_u64())
    }

    pub fn is_defined(&self) -> TbResult<bool> {
        Ok(self.value()?.is_defined())
    }

    /// Claims exclusive write access. Fails with [`TbError::AlreadyDriven`] while another
    /// driver of this signal is alive.
    pub fn drive(self) -> TbResult<Driver> {
        if let ObjectKind::Hier = self.kind {
            return Err(TbError::NotASignal(self.name()?));
        }
        sim()?.claim_driver(self.handle)?;
        Ok(Driver { obj: self })
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub fn falling_edge(self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub fn edge(self) -> Trigger {
        Trigger::edge(self)
    }
}

/// Exclusive writer of one signal. The claim is released when the driver is dropped.
#[derive(Debug)]
pub struct Driver {
    obj: SimObject,
}

impl Driver {
    pub fn object(&self) -> SimObject {
        self.obj
    }

    pub fn set(&self, val: u64) -> TbResult {
        self.set_value(LogicVec::from_u64(val, self.obj.width()))
    }

    pub fn set_value(&self, val: LogicVec) -> TbResult {
        if val.width() != self.obj.width() {
            return Err(TbError::WidthMismatch {
                name: self.obj.name()?,
                expected: self.obj.width(),
                actual: val.width(),
            });
        }
        sim()?.set_value(self.obj.handle, val)
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Ok(sim) = sim() {
            sim.release_driver(self.obj.handle);
        }
    }
}
