//! Module driver
//!
//! Each subsystem of the application registers a [`ConfigModule`]: it
//! knows how to default, read, reload and document its own slice of the
//! configuration. The driver sequences them over one parsed tree.

use policykoll_syntax::ConfigFile;
use policykoll_types::ConfigError;
use std::io;

bitflags::bitflags! {
    /// Which modules a configuration operation applies to
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct ModuleMask: u32 {
        /// The module runs regardless of the requested mask
        const ALWAYS = 1 << 31;
    }
}

impl ModuleMask {
    /// An application-defined module bit
    #[must_use]
    pub fn bit(n: u8) -> Self {
        debug_assert!(n < 31);
        Self::from_bits_retain(1 << (n % 31))
    }
}

fn selected(flags: ModuleMask, mask: ModuleMask) -> bool {
    flags == ModuleMask::ALWAYS || flags.intersects(mask)
}

/// One configuration module: a named slice of the application
/// configuration with its own defaulting, reading and reloading logic.
pub trait ConfigModule<C> {
    fn name(&self) -> &'static str;

    fn mask(&self) -> ModuleMask {
        ModuleMask::ALWAYS
    }

    /// Fill the module's defaults into the configuration
    fn set_default(&self, config: &mut C) -> Result<(), ConfigError>;

    /// Read the module's parameters from the parsed tree
    fn read(&self, tree: &ConfigFile, config: &mut C, for_reload: bool)
    -> Result<(), ConfigError>;

    /// Apply the hot-reloadable subset of a freshly read configuration.
    /// Modules without reloadable parameters keep the default no-op.
    fn reload(&self, new_config: &C) -> Result<(), ConfigError> {
        let _ = new_config;
        Ok(())
    }

    /// Write a documented configuration template for this module
    fn write_template(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let _ = out;
        Ok(())
    }

    /// Write the module's default values
    fn write_default(&self, out: &mut dyn io::Write) -> io::Result<()> {
        let _ = out;
        Ok(())
    }
}

/// Populate `config` from a parsed tree: for every selected module, set
/// defaults then read. The first failing module aborts the walk.
pub fn read_config<C>(
    tree: &ConfigFile,
    modules: &[&dyn ConfigModule<C>],
    config: &mut C,
    mask: ModuleMask,
    for_reload: bool,
) -> Result<(), ConfigError> {
    for module in modules {
        if !selected(module.mask(), mask) {
            continue;
        }
        module.set_default(config).map_err(|e| {
            e.context(&format!(
                "Error setting default configuration for module '{}'",
                module.name()
            ))
        })?;
        module.read(tree, config, for_reload).map_err(|e| {
            e.context(&format!(
                "Error reading configuration for module '{}'",
                module.name()
            ))
        })?;
    }
    Ok(())
}

/// Apply a freshly compiled configuration module by module. Unlike
/// [`read_config`] this never short-circuits: every selected module gets
/// its chance, failures are logged and the last one is returned.
pub fn reload_config<C>(
    modules: &[&dyn ConfigModule<C>],
    new_config: &C,
    mask: ModuleMask,
) -> Result<(), ConfigError> {
    let mut last_error = None;
    for module in modules {
        if !selected(module.mask(), mask) {
            continue;
        }
        match module.reload(new_config) {
            Ok(()) => tracing::info!(
                target: "reload",
                "Configuration of module '{}' successfully reloaded",
                module.name()
            ),
            Err(e) => {
                tracing::error!(
                    target: "reload",
                    "Error reloading configuration for module '{}': {e}",
                    module.name()
                );
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Write a documented configuration file template for all modules
pub fn write_template<C>(
    modules: &[&dyn ConfigModule<C>],
    out: &mut dyn io::Write,
) -> io::Result<()> {
    writeln!(out, "############################################")?;
    writeln!(out, "# policykoll configuration file template   #")?;
    writeln!(out, "############################################")?;
    writeln!(out)?;
    for module in modules {
        writeln!(out, "# {} configuration", module.name())?;
        module.write_template(out)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the default value of every parameter of every module
pub fn write_defaults<C>(
    modules: &[&dyn ConfigModule<C>],
    out: &mut dyn io::Write,
) -> io::Result<()> {
    writeln!(out, "# Default configuration values")?;
    for module in modules {
        module.write_default(out)?;
        writeln!(out)?;
    }
    Ok(())
}
