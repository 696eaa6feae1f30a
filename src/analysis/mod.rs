//! Oscillation-envelope analysis of the deflation waveform.
//!
//! Runs once, offline, over the completed sample series of a reliable
//! deflation: build the rolling-average baseline and oscillation envelope
//! ([`envelope`]), then locate the amplitude-ratio crossings and count
//! heartbeats ([`extractor`]).

pub mod envelope;
pub mod extractor;

pub use envelope::Envelope;
pub use extractor::estimate;
