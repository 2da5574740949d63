//! Error types for oxcmm

use std::fmt;
use thiserror::Error;

/// Result type for oxcmm operations
pub type Result<T> = std::result::Result<T, CmmError>;

/// Backend call that failed while building a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStage {
    /// Single two-profile transform (no proof, or proof equal to an endpoint)
    Direct,
    /// Source to proof transform of the proofing path
    ProofIntermediate,
    /// Conversion of the intermediate transform into a device link
    DeviceLink,
    /// Chained transform over device link, proof and destination
    ProofChain,
}

impl fmt::Display for LinkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStage::Direct => write!(f, "direct transform"),
            LinkStage::ProofIntermediate => write!(f, "source to proof transform"),
            LinkStage::DeviceLink => write!(f, "device link synthesis"),
            LinkStage::ProofChain => write!(f, "proof chain transform"),
        }
    }
}

/// Errors that can occur in oxcmm operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CmmError {
    /// Backend context could not be created
    #[error("CMM failed to initialize")]
    Init,

    /// Malformed or unsupported ICC data, or a profile without a backend handle
    #[error("Invalid ICC profile")]
    InvalidProfile,

    /// A backend transform-creation step failed
    #[error("Failed to create color link: {stage} failed")]
    LinkCreation { stage: LinkStage },

    /// Pixel buffer channel counts disagree with the link's compiled format
    #[error(
        "Mismatching color setup in cmm pixmap transformation: src: {src_expected} vs {src_actual}, dst: {dst_expected} vs {dst_actual}"
    )]
    ChannelMismatch {
        src_expected: usize,
        src_actual: usize,
        dst_expected: usize,
        dst_actual: usize,
    },

    /// The host allocator refused a backend allocation
    #[error("Out of memory in color management backend")]
    OutOfMemory,

    /// Bytes per channel other than 1 or 2
    #[error("Unsupported sample depth: {0} bytes per channel")]
    UnsupportedDepth(u8),

    /// Transform requested on a link that holds no backend handle
    #[error("Color link has no transform")]
    EmptyLink,

    /// Sample storage shorter than the buffer geometry requires
    #[error("Buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    /// Destination geometry cannot hold the source geometry
    #[error("Pixmap dimensions mismatch: src {src_w}x{src_h}, dst {dst_w}x{dst_h}")]
    DimensionMismatch {
        src_w: usize,
        src_h: usize,
        dst_w: usize,
        dst_h: usize,
    },

    /// Buffer length or width beyond the backend's 32-bit counters
    #[error("Buffer exceeds backend limits")]
    TooLarge,

    /// Profile or link created under a different instance
    #[error("Color handle belongs to another CMM instance")]
    ForeignHandle,

    /// Instance created by a different engine
    #[error("Instance belongs to engine '{actual}', not '{expected}'")]
    EngineMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// No engine registered under this name
    #[error("Unknown CMM engine: {0}")]
    UnknownEngine(String),

    /// An engine with this name is already registered
    #[error("CMM engine already registered: {0}")]
    DuplicateEngine(&'static str),
}

impl CmmError {
    /// Backend failure during link construction, or out-of-memory if the
    /// allocator bridge saw a refused allocation.
    pub(crate) fn link(stage: LinkStage, alloc_failed: bool) -> Self {
        if alloc_failed {
            CmmError::OutOfMemory
        } else {
            CmmError::LinkCreation { stage }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mismatch_message_lists_both_sides() {
        let err = CmmError::ChannelMismatch {
            src_expected: 3,
            src_actual: 1,
            dst_expected: 4,
            dst_actual: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("src: 3 vs 1"));
        assert!(msg.contains("dst: 4 vs 4"));
    }

    #[test]
    fn test_link_error_prefers_out_of_memory() {
        assert_eq!(CmmError::link(LinkStage::DeviceLink, true), CmmError::OutOfMemory);
        assert_eq!(
            CmmError::link(LinkStage::DeviceLink, false),
            CmmError::LinkCreation {
                stage: LinkStage::DeviceLink
            }
        );
    }
}
