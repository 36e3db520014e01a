//! Configuration file loading.
//!
//! Configuration layers, lowest to highest:
//!
//! 1. Property defaults registered by the build classes
//! 2. Distribution config (`modbuild.yml`, then `modbuild.local.yml`)
//! 3. The `_build/config.yml` checkpoint, when resuming
//! 4. rc-file arguments for the action (`~/.modbuildrc.yml`)
//! 5. Command-line arguments

pub mod loader;

pub use loader::{
    find_project_root, load_config_value, load_properties, parse_properties, ConfigPaths,
    RcFile, CONFIG_FILE, LOCAL_CONFIG_FILE, RC_ENV,
};
