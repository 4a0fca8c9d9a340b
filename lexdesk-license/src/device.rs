//! Machine fingerprinting for license binding.
//!
//! The fingerprint is recomputed from OS queries on every start and never
//! persisted on its own, so it cannot drift away from the hardware it
//! describes. Only inputs that survive a reboot are used.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;
use std::io;
use tracing::{debug, warn};

/// Number of hex characters kept from the digest.
const FINGERPRINT_HEX_LEN: usize = 32;

/// Hex characters per dash-separated group.
const FINGERPRINT_GROUP_LEN: usize = 8;

/// Host metadata the fingerprint is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    /// Hostname.
    pub hostname: String,
    /// Operating system name.
    pub platform: String,
    /// CPU architecture.
    pub arch: String,
    /// Model string of the first logical CPU.
    pub cpu_model: String,
    /// Total physical memory in bytes.
    pub total_memory: u64,
}

impl HostMetadata {
    /// Collects metadata for the current machine.
    ///
    /// # Errors
    ///
    /// Returns an error if the CPU model or memory size cannot be read.
    pub fn collect() -> io::Result<Self> {
        Ok(Self {
            hostname: get_hostname(),
            platform: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            cpu_model: get_cpu_model()?,
            total_memory: get_total_memory()?,
        })
    }

    fn concatenated(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.hostname, self.platform, self.arch, self.cpu_model, self.total_memory
        )
    }
}

/// A stable identifier for this machine, formatted as four dash-separated
/// groups of eight uppercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineFingerprint(String);

impl MachineFingerprint {
    /// Generates the fingerprint for the current machine.
    ///
    /// Falls back to a hostname-only fingerprint if hardware metadata is
    /// unavailable.
    #[must_use]
    pub fn generate() -> Self {
        match HostMetadata::collect() {
            Ok(meta) => {
                debug!(platform = %meta.platform, arch = %meta.arch, "Collected host metadata");
                Self::from_metadata(&meta)
            }
            Err(e) => {
                warn!("Host metadata unavailable ({e}), using hostname-only fingerprint");
                Self::from_hostname(&get_hostname())
            }
        }
    }

    /// Derives the fingerprint from already collected metadata.
    #[must_use]
    pub fn from_metadata(meta: &HostMetadata) -> Self {
        Self::from_source(&meta.concatenated())
    }

    /// Lower-entropy fingerprint derived from the hostname alone.
    #[must_use]
    pub fn from_hostname(hostname: &str) -> Self {
        Self::from_source(hostname)
    }

    /// Parses a fingerprint supplied by a customer, normalising case and
    /// surrounding whitespace.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        let groups: Vec<&str> = normalized.split('-').collect();
        let well_formed = groups.len() == FINGERPRINT_HEX_LEN / FINGERPRINT_GROUP_LEN
            && groups.iter().all(|g| {
                g.len() == FINGERPRINT_GROUP_LEN && g.chars().all(|c| c.is_ascii_hexdigit())
            });
        well_formed.then_some(Self(normalized))
    }

    /// Returns the fingerprint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_source(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let hex = hex::encode_upper(digest);
        Self(group(&hex[..FINGERPRINT_HEX_LEN], FINGERPRINT_GROUP_LEN))
    }
}

impl fmt::Display for MachineFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MachineFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generates the fingerprint for the current machine.
#[must_use]
pub fn generate_fingerprint() -> MachineFingerprint {
    MachineFingerprint::generate()
}

/// Splits an ASCII string into dash-separated groups of `size` characters.
pub(crate) fn group(s: &str, size: usize) -> String {
    s.as_bytes()
        .chunks(size)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn unavailable(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{what} unavailable"))
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
fn command_output(program: &str, args: &[&str]) -> io::Result<String> {
    let output = std::process::Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!("{program} exited with {}", output.status)));
    }
    String::from_utf8(output.stdout).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn get_cpu_model() -> io::Result<String> {
    #[cfg(target_os = "linux")]
    {
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo")?;
        parse_cpuinfo_model(&cpuinfo).ok_or_else(|| unavailable("cpu model"))
    }

    #[cfg(target_os = "macos")]
    {
        let brand = command_output("sysctl", &["-n", "machdep.cpu.brand_string"])?;
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(unavailable("cpu model"));
        }
        Ok(brand.to_string())
    }

    #[cfg(target_os = "windows")]
    {
        env::var("PROCESSOR_IDENTIFIER").map_err(|_| unavailable("cpu model"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err(unavailable("cpu model"))
    }
}

fn get_total_memory() -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        let meminfo = std::fs::read_to_string("/proc/meminfo")?;
        parse_meminfo_total(&meminfo).ok_or_else(|| unavailable("total memory"))
    }

    #[cfg(target_os = "macos")]
    {
        command_output("sysctl", &["-n", "hw.memsize"])?
            .trim()
            .parse()
            .map_err(|_| unavailable("total memory"))
    }

    #[cfg(target_os = "windows")]
    {
        command_output("wmic", &["ComputerSystem", "get", "TotalPhysicalMemory", "/value"])?
            .lines()
            .find_map(|l| l.trim().strip_prefix("TotalPhysicalMemory="))
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| unavailable("total memory"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        Err(unavailable("total memory"))
    }
}

/// First `model name` entry; ARM kernels report `Hardware` or `cpu model`
/// instead.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpuinfo_model(cpuinfo: &str) -> Option<String> {
    ["model name", "cpu model", "Hardware", "Processor"]
        .iter()
        .find_map(|key| {
            cpuinfo.lines().find_map(|line| {
                let (k, v) = line.split_once(':')?;
                (k.trim() == *key && !v.trim().is_empty()).then(|| v.trim().to_string())
            })
        })
}

/// `MemTotal` in bytes.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_meminfo_total(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line
        .trim_start_matches("MemTotal:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kib * 1024)
}
