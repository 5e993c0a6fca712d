pub mod wav;
pub use wav::{WAV_HEADER_SIZE, WavError, WavResult, frame_pcm, mono_pcm16, pcm_to_wav};
