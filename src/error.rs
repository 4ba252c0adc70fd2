use std::io;

/// Errors surfaced at the config-loading / CLI boundary.
///
/// Nothing below this crosses out of the packet- or segment-processing hot
/// path: malformed wire input is dropped in place, not converted into one of
/// these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed config line {line_no}: {line}")]
    MalformedLine { line_no: usize, line: String },

    #[error("invalid MAC address {0}")]
    InvalidMac(String),

    #[error("invalid IPv4 address {0}")]
    InvalidIpv4(String),

    #[error("unknown interface {0} referenced by route")]
    UnknownInterface(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
