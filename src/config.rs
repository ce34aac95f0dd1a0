use std::path::Path;

use facet::Facet;

use crate::error::GuestctlError;

/// Top-level configuration, read from `guestctl.toml`.
///
/// Every flag the external tools are invoked with is an explicit option
/// here, so nothing about the QEMU or SSH invocations is hard-wired into
/// the call sites. A missing config file means "all defaults", which
/// reproduces the stock Debian guest setup.
#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Config {
    #[facet(default)]
    pub hypervisor: HypervisorConfig,
    #[facet(default)]
    pub disk: DiskConfig,
    #[facet(default)]
    pub installer: InstallerConfig,
    #[facet(default)]
    pub network: NetworkConfig,
    #[facet(default)]
    pub ssh: SshConfig,
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct HypervisorConfig {
    /// Emulator binary to launch.
    #[facet(default = HypervisorConfig::default().program)]
    pub program: String,
    /// Guest memory size, passed to `-m`.
    #[facet(default = HypervisorConfig::default().memory)]
    pub memory: String,
    /// Machine type, passed to `-M`.
    #[facet(default = HypervisorConfig::default().machine)]
    pub machine: String,
    /// Acceleration backend, passed to `-accel`.
    #[facet(default = HypervisorConfig::default().accel)]
    pub accel: String,
    /// Display adapter, passed to `-device`.
    #[facet(default = HypervisorConfig::default().display_device)]
    pub display_device: String,
    /// VNC display used when the guest runs headless (connect mode).
    #[facet(default = HypervisorConfig::default().vnc_display)]
    pub vnc_display: String,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            program: "qemu-system-x86_64".into(),
            memory: "2G".into(),
            machine: "q35".into(),
            accel: default_accel(),
            display_device: "virtio-gpu".into(),
            vnc_display: ":0".into(),
        }
    }
}

/// WHPX on Windows hosts, KVM everywhere else. Overridable in the config.
fn default_accel() -> String {
    if cfg!(windows) {
        "whpx,kernel-irqchip=off".into()
    } else {
        "kvm".into()
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct DiskConfig {
    /// Disk image creation utility.
    #[facet(default = DiskConfig::default().program)]
    pub program: String,
    /// Path of the guest disk image, relative to the working directory.
    #[facet(default = DiskConfig::default().path)]
    pub path: String,
    /// Image format, passed to both `qemu-img -f` and the QEMU drive option.
    #[facet(default = DiskConfig::default().format)]
    pub format: String,
    /// Virtual disk size, passed verbatim to the image utility.
    #[facet(default = DiskConfig::default().size)]
    pub size: String,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            program: "qemu-img".into(),
            path: "linux.qcow2".into(),
            format: "qcow2".into(),
            size: "10G".into(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct InstallerConfig {
    /// Where the installer ISO is downloaded from.
    #[facet(default = InstallerConfig::default().url)]
    pub url: String,
    /// Local path of the downloaded ISO.
    #[facet(default = InstallerConfig::default().path)]
    pub path: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            url: "https://cdimage.debian.org/debian-cd/current/amd64/iso-cd/debian-12.9.0-amd64-netinst.iso".into(),
            path: "installer.iso".into(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct NetworkConfig {
    /// Host side of the TCP port forward into the guest.
    #[facet(default = NetworkConfig::default().host_port)]
    pub host_port: u16,
    /// Guest side of the forward (the guest's SSH daemon).
    #[facet(default = NetworkConfig::default().guest_port)]
    pub guest_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host_port: 2222,
            guest_port: 22,
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct SshConfig {
    /// Remote-shell client binary.
    #[facet(default = SshConfig::default().program)]
    pub program: String,
    /// Host the client connects to (the forward lands on localhost).
    #[facet(default = SshConfig::default().host)]
    pub host: String,
    /// Whether to request X11 forwarding (`-X`).
    #[facet(default = SshConfig::default().forward_x11)]
    pub forward_x11: bool,
    /// Exit code the client reserves for connection-level failure.
    /// The reachability loop retries on exactly this code.
    #[facet(default = SshConfig::default().transient_exit_code)]
    pub transient_exit_code: i32,
    /// Pause between connection attempts, in milliseconds.
    #[facet(default = SshConfig::default().retry_delay_ms)]
    pub retry_delay_ms: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: "ssh".into(),
            host: "localhost".into(),
            forward_x11: true,
            transient_exit_code: 255,
            retry_delay_ms: 1000,
        }
    }
}

/// Load the config from `path`, falling back to defaults when the file
/// does not exist. A file that exists but fails to read or parse is an
/// error; silently ignoring a broken config would mask typos.
pub fn load_config(path: &Path) -> Result<Config, GuestctlError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let text = std::fs::read_to_string(path).map_err(|e| GuestctlError::ConfigLoad {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: Config =
        facet_toml::from_str(&text).map_err(|e| GuestctlError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), GuestctlError> {
    if config.disk.path.is_empty() {
        return Err(GuestctlError::Validation {
            message: "disk.path must not be empty".into(),
        });
    }
    if config.installer.path.is_empty() {
        return Err(GuestctlError::Validation {
            message: "installer.path must not be empty".into(),
        });
    }
    if !config.installer.url.starts_with("http://") && !config.installer.url.starts_with("https://")
    {
        return Err(GuestctlError::Validation {
            message: format!("installer.url must be http(s): '{}'", config.installer.url),
        });
    }
    if config.network.host_port == 0 || config.network.guest_port == 0 {
        return Err(GuestctlError::Validation {
            message: "network ports must be non-zero".into(),
        });
    }
    parse_disk_size(&config.disk.size)?;
    Ok(())
}

/// Parse a disk size like `"10G"`, `"512M"` or `"1073741824"` into bytes.
///
/// The value is handed verbatim to the image utility; parsing it up front
/// turns a typo into a config error instead of a cryptic child failure.
/// Binary units (1G = 1024³).
pub fn parse_disk_size(s: &str) -> Result<u64, GuestctlError> {
    let s = s.trim();
    let invalid = |s: &str| GuestctlError::Validation {
        message: format!("invalid disk size: '{s}' (use e.g. 10G, 512M, or bytes)"),
    };

    let (digits, unit) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()));
    if digits.is_empty() {
        return Err(invalid(s));
    }
    let num: u64 = digits.parse().map_err(|_| invalid(s))?;

    let shift = match unit.to_ascii_uppercase().as_str() {
        "" => 0,
        "K" | "KB" => 10,
        "M" | "MB" => 20,
        "G" | "GB" => 30,
        "T" | "TB" => 40,
        _ => return Err(invalid(s)),
    };

    num.checked_shl(shift)
        .filter(|_| num.leading_zeros() >= shift)
        .ok_or_else(|| invalid(s))
}
