//! Pool configuration

use softtimer_core::TickRate;

/// Pool-wide settings fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Name shown in log output
    pub name: &'static str,
    /// Millisecond to tick conversion used by the `*_millis` operations
    pub tick_rate: TickRate,
}

impl PoolConfig {
    /// Configuration usable in `static` initializers
    pub const fn new(tick_rate: TickRate) -> Self {
        Self {
            name: "timers",
            tick_rate,
        }
    }

    /// Creates a new pool configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(TickRate::MICROS)
    }
}

/// Builder for pool configuration
#[derive(Debug, Clone, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Sets the pool name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the tick rate of the underlying counter.
    pub fn tick_rate(mut self, rate: TickRate) -> Self {
        self.config.tick_rate = rate;
        self
    }

    /// Finalizes the configuration.
    pub fn build(self) -> PoolConfig {
        self.config
    }
}
