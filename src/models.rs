//! Reference design models for the built-in kernel.

use crate::kernel::{Model, PortBank, PortDecl};
use crate::value::{Logic, LogicVec};

/// Program memory initialization time of [`TinyCore`] after reset release.
pub const TINY_CORE_INIT_CYCLES: u32 = 16;

/// Small Tiny Tapeout style core.
///
/// * reset (`rst_n` low on a rising edge) clears the counter and restarts program
///   memory initialization;
/// * while initializing, `uio_out` is unknown;
/// * afterwards, with `ena` high, `uo_out` counts rising edges and `uio_out`
///   mirrors `ui_in` from the previous edge.
///
/// Before the first reset all state is unknown.
pub struct TinyCore {
    init_cycles: u32,
    stuck_unknown: Option<(String, u32)>,
    prev_clk: Logic,
    counter: LogicVec,
    latched: LogicVec,
    // None until the first reset
    init_remaining: Option<u32>,
}

impl TinyCore {
    pub fn new() -> Self {
        Self::with_init_cycles(TINY_CORE_INIT_CYCLES)
    }

    pub fn with_init_cycles(init_cycles: u32) -> Self {
        Self {
            init_cycles,
            stuck_unknown: None,
            prev_clk: Logic::X,
            counter: LogicVec::new_x(8),
            latched: LogicVec::new_x(8),
            init_remaining: None,
        }
    }

    /// Fault injection: `bit` of output `port` is permanently unknown.
    pub fn with_stuck_unknown(mut self, port: &str, bit: u32) -> Self {
        self.stuck_unknown = Some((port.to_string(), bit));
        self
    }

    fn on_rising_edge(&mut self, ports: &PortBank<'_>) {
        match ports.bit("rst_n") {
            Logic::Zero => {
                self.counter = LogicVec::from_u64(0, 8);
                self.latched = LogicVec::from_u64(0, 8);
                self.init_remaining = Some(self.init_cycles);
            }
            Logic::One => {
                if ports.bit("ena") != Logic::One {
                    return;
                }
                match self.init_remaining {
                    Some(0) => {
                        self.counter = match self.counter.to_u64() {
                            Some(n) => LogicVec::from_u64((n + 1) & 0xff, 8),
                            None => LogicVec::new_x(8),
                        };
                        self.latched = ports
                            .get("ui_in")
                            .cloned()
                            .unwrap_or_else(|| LogicVec::new_x(8));
                    }
                    Some(n) => self.init_remaining = Some(n - 1),
                    None => {}
                }
            }
            _ => {
                self.counter = LogicVec::new_x(8);
                self.latched = LogicVec::new_x(8);
                self.init_remaining = None;
            }
        }
    }

    fn drive(&self, ports: &mut PortBank<'_>, port: &str, mut value: LogicVec) {
        if let Some((stuck_port, bit)) = &self.stuck_unknown {
            if stuck_port == port && *bit < value.width() {
                value.set(*bit, Logic::X);
            }
        }
        ports.set(port, value);
    }
}

impl Default for TinyCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for TinyCore {
    fn ports(&self) -> Vec<PortDecl> {
        vec![
            PortDecl::input("clk", 1),
            PortDecl::input("rst_n", 1),
            PortDecl::input("ena", 1),
            PortDecl::input("ui_in", 8),
            PortDecl::input("uio_in", 8),
            PortDecl::output("uo_out", 8),
            PortDecl::output("uio_out", 8),
            PortDecl::output("uio_oe", 8),
        ]
    }

    fn eval(&mut self, ports: &mut PortBank<'_>) {
        let clk = ports.bit("clk");
        if clk == Logic::One && self.prev_clk != Logic::One {
            self.on_rising_edge(ports);
        }
        self.prev_clk = clk;

        let initialized = self.init_remaining == Some(0);
        let uio_out = match initialized {
            true => self.latched.clone(),
            false => LogicVec::new_x(8),
        };
        let uio_oe = match self.init_remaining {
            Some(_) => LogicVec::from_u64(0xff, 8),
            None => LogicVec::new_x(8),
        };
        self.drive(ports, "uo_out", self.counter.clone());
        self.drive(ports, "uio_out", uio_out);
        self.drive(ports, "uio_oe", uio_oe);
    }
}
