pub mod analysis;
pub mod audio_constants;
pub mod bitstream;
pub mod error;
pub mod pcm;
pub mod types;

pub use analysis::{compare, ErrorMetrics};
pub use audio_constants::*;
pub use bitstream::{BitReader, BitWriter};
pub use error::{CosaError, CosaResult};
pub use pcm::{PcmSink, PcmSource, SliceSource};
pub use types::*;
