//! Configuration resolution
//!
//! Merges the architecture profile, the run config file, and the image
//! config file into one immutable [`LaunchSpec`]. All validation happens
//! here, before any external process starts; defaults are applied exactly
//! once, centrally.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::common::{Error, Result};

/// Default host port forwarded to the guest's SSH port
pub const DEFAULT_PORT: u16 = 2222;

/// Default script executed inside the deployed benchmark directory
pub const DEFAULT_REMOTE_SCRIPT: &str = "runner.sh";

/// Architecture names the resolver accepts
pub const SUPPORTED_ARCHS: [&str; 2] = ["arm64", "i386"];

/// One of the fixed emulator build profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchProfile {
    pub name: &'static str,
    pub cpu_model: &'static str,
    pub build_dir: &'static str,
    pub qemu_arch: &'static str,
}

const ARM64: ArchProfile = ArchProfile {
    name: "arm64",
    cpu_model: "cortex-a57",
    build_dir: "buildDirARM64/aarch64-softmmu/",
    qemu_arch: "aarch64",
};

const I386: ArchProfile = ArchProfile {
    name: "i386",
    cpu_model: "",
    build_dir: "buildDirX86/i386-softmmu/",
    qemu_arch: "i386",
};

impl ArchProfile {
    /// Look up a profile by name
    pub fn lookup(name: &str) -> Result<Self> {
        match name {
            "arm64" => Ok(ARM64),
            "i386" => Ok(I386),
            other => Err(Error::unsupported_architecture(other, &SUPPORTED_ARCHS)),
        }
    }

    /// Path of the emulator binary inside the build tree
    pub fn emulator_binary(&self) -> String {
        format!("./{}qemu-system-{}", self.build_dir, self.qemu_arch)
    }
}

/// Raw run config as it appears on disk. Every key is optional; unknown
/// keys are ignored.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RunConfigFile {
    memory: Option<String>,
    emu_machine_type: Option<String>,
    global: Option<String>,
    devices: Option<Vec<String>>,
    netdev: Option<String>,
    /// Number or numeric string; anything else is `InvalidPort`
    port_number: Option<Value>,
    append: Option<String>,
    /// Presence flag, value ignored
    nographic: Option<Value>,
    drive_param: Option<String>,
    remote_benchmark_dir: Option<String>,
    remotescript_exec: Option<String>,
}

/// Run config with defaults resolved
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub memory: Option<String>,
    pub machine_type: Option<String>,
    pub global: Option<String>,
    pub devices: Vec<String>,
    pub netdev: Option<String>,
    pub port: u16,
    pub append: Option<String>,
    pub nographic: bool,
    pub drive_param: Option<String>,
    pub remote_benchmark_dir: String,
    pub remote_script: String,
}

/// Image config file contents. Paths are relative to the config file's
/// parent directory.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImageConfig {
    pub kernel: Option<String>,
    pub initrd: Option<String>,
    pub drive: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Fully resolved, immutable description of one benchmark run.
/// Constructed once by [`resolve`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub arch: ArchProfile,
    pub run: RunConfig,
    pub image: ImageConfig,
    /// Directory of the image config file, kernel/initrd/drive are
    /// joined against it
    pub image_dir: PathBuf,
    pub benchmark_path: PathBuf,
    pub plugin_path: PathBuf,
}

/// Resolve raw inputs into a [`LaunchSpec`] or a classified
/// configuration error. Reads the two config files but has no other
/// side effects; nothing is launched on any abort path.
pub fn resolve(
    arch_name: &str,
    run_config_path: Option<&Path>,
    image_config_path: Option<&Path>,
    benchmark_path: Option<&Path>,
    plugin_path: Option<&Path>,
) -> Result<LaunchSpec> {
    let arch = ArchProfile::lookup(arch_name)?;

    // An empty path string counts as missing, same as no path at all
    let run_config_path = match run_config_path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(Error::MissingConfig),
    };
    let image_config_path = match image_config_path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(Error::MissingImageConfig),
    };

    let run_file: RunConfigFile = load_json(run_config_path)?;
    let image: ImageConfig = load_json(image_config_path)?;

    let benchmark_path = match benchmark_path {
        Some(p) if p.is_dir() => p.to_path_buf(),
        Some(p) => return Err(Error::MissingBenchmarkPath(p.display().to_string())),
        None => return Err(Error::MissingBenchmarkPath(String::new())),
    };

    let plugin_path = match plugin_path {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) => return Err(Error::MissingPluginPath(p.display().to_string())),
        None => return Err(Error::MissingPluginPath(String::new())),
    };

    let run = RunConfig {
        memory: run_file.memory,
        machine_type: run_file.emu_machine_type,
        global: run_file.global,
        devices: run_file.devices.unwrap_or_default(),
        netdev: run_file.netdev,
        port: resolve_port(run_file.port_number.as_ref())?,
        append: run_file.append,
        nographic: run_file.nographic.is_some(),
        drive_param: run_file.drive_param,
        remote_benchmark_dir: run_file.remote_benchmark_dir.unwrap_or_default(),
        remote_script: run_file
            .remotescript_exec
            .unwrap_or_else(|| DEFAULT_REMOTE_SCRIPT.to_string()),
    };

    let image_dir = image_config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(LaunchSpec {
        arch,
        run,
        image,
        image_dir,
        benchmark_path,
        plugin_path,
    })
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config_parse(&path.display().to_string(), e))
}

/// A missing port resolves to the default; a JSON number or a numeric
/// string resolves to itself; everything else is rejected
fn resolve_port(value: Option<&Value>) -> Result<u16> {
    let value = match value {
        None => return Ok(DEFAULT_PORT),
        Some(v) => v,
    };
    let port = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    match port {
        Some(p) if p > 0 => Ok(p),
        _ => Err(Error::InvalidPort(render_port(value))),
    }
}

fn render_port(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
