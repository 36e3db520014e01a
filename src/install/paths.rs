//! Install element types, install sets and their default layouts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A kind of installable element, staged under `blib/<type>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InstallType {
    Lib,
    Arch,
    Bin,
    Script,
    Bindoc,
    Libdoc,
    Binhtml,
    Libhtml,
}

impl InstallType {
    pub const ALL: [InstallType; 8] = [
        InstallType::Lib,
        InstallType::Arch,
        InstallType::Bin,
        InstallType::Script,
        InstallType::Bindoc,
        InstallType::Libdoc,
        InstallType::Binhtml,
        InstallType::Libhtml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallType::Lib => "lib",
            InstallType::Arch => "arch",
            InstallType::Bin => "bin",
            InstallType::Script => "script",
            InstallType::Bindoc => "bindoc",
            InstallType::Libdoc => "libdoc",
            InstallType::Binhtml => "binhtml",
            InstallType::Libhtml => "libhtml",
        }
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown install type '{}'", s))
    }
}

/// A named install set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InstallDirs {
    Core,
    #[default]
    Site,
    Vendor,
}

impl InstallDirs {
    pub const ALL: [InstallDirs; 3] = [InstallDirs::Core, InstallDirs::Site, InstallDirs::Vendor];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallDirs::Core => "core",
            InstallDirs::Site => "site",
            InstallDirs::Vendor => "vendor",
        }
    }
}

impl fmt::Display for InstallDirs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallDirs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("installdirs must be one of core, site or vendor, not '{}'", s))
    }
}

/// Parse a `<installdirs>.<type>` key such as `site.lib`.
pub fn parse_set_key(key: &str) -> Option<(InstallDirs, InstallType)> {
    let (dirs, ty) = key.split_once('.')?;
    Some((dirs.parse().ok()?, ty.parse().ok()?))
}

/// Architecture-specific directory name, e.g. `x86_64-linux`.
pub fn arch_name() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

fn shared_relpath(ty: InstallType) -> Option<PathBuf> {
    let rel = match ty {
        InstallType::Bin | InstallType::Script => "bin",
        InstallType::Bindoc => "man/man1",
        InstallType::Libdoc => "man/man3",
        InstallType::Binhtml | InstallType::Libhtml => "html",
        InstallType::Lib | InstallType::Arch => return None,
    };
    Some(PathBuf::from(rel))
}

/// Relative layout under an `install_base`.
pub fn default_install_base_relpaths() -> BTreeMap<InstallType, PathBuf> {
    InstallType::ALL
        .into_iter()
        .filter_map(|ty| {
            let rel = match ty {
                InstallType::Lib => PathBuf::from("lib"),
                InstallType::Arch => PathBuf::from("lib").join(arch_name()),
                other => shared_relpath(other)?,
            };
            Some((ty, rel))
        })
        .collect()
}

/// Relative layout under a `prefix`, per install set.
pub fn default_prefix_relpaths() -> BTreeMap<(InstallDirs, InstallType), PathBuf> {
    let mut relpaths = BTreeMap::new();
    for dirs in InstallDirs::ALL {
        let lib = PathBuf::from("lib").join(dirs.as_str());
        for ty in InstallType::ALL {
            let rel = match ty {
                InstallType::Lib => lib.clone(),
                InstallType::Arch => lib.join(arch_name()),
                other => match shared_relpath(other) {
                    Some(rel) => rel,
                    None => continue,
                },
            };
            relpaths.insert((dirs, ty), rel);
        }
    }
    relpaths
}

/// The prefix each install set was laid out under.
pub fn default_original_prefix() -> BTreeMap<InstallDirs, PathBuf> {
    BTreeMap::from([
        (InstallDirs::Core, PathBuf::from("/usr")),
        (InstallDirs::Site, PathBuf::from("/usr/local")),
        (InstallDirs::Vendor, PathBuf::from("/usr")),
    ])
}

/// Absolute destinations of each install set.
pub fn default_install_sets() -> BTreeMap<(InstallDirs, InstallType), PathBuf> {
    let prefixes = default_original_prefix();
    default_prefix_relpaths()
        .into_iter()
        .filter_map(|((dirs, ty), rel)| Some(((dirs, ty), prefixes.get(&dirs)?.join(rel))))
        .collect()
}
