//! Averaging of raw reads of the probe-sense line.

use heapless::Vec;

use crate::hal::ProbeAdc;

/// Upper bound of raw reads taken for a single sample.
pub const MAX_READS: usize = 8;

/// Decides how many raw reads make a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleContext {
    #[default]
    Rows,
    /// Function pads sit in a noisy region of the scale, they need more
    /// reads to settle.
    Pads,
}

impl SampleContext {
    #[must_use]
    pub fn reads(self) -> usize {
        match self {
            Self::Rows => 4,
            Self::Pads => MAX_READS,
        }
    }
}

/// Raw reads forming one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    reads: Vec<u16, MAX_READS>,
}

impl Sample {
    /// Build a sample out of given reads, ignoring those that do not fit.
    #[must_use]
    pub fn from_reads(reads: &[u16]) -> Self {
        let mut sample = Self { reads: Vec::new() };
        for read in reads.iter().take(MAX_READS) {
            // NOTE: This is safe since the number of reads is capped above.
            let _: Result<_, _> = sample.reads.push(*read);
        }
        sample
    }

    /// Integer mean of all reads, zero for an empty sample.
    #[must_use]
    pub fn mean(&self) -> u16 {
        if self.reads.is_empty() {
            return 0;
        }
        let sum: u32 = self.reads.iter().map(|r| u32::from(*r)).sum();
        (sum / self.reads.len() as u32) as u16
    }

    /// Largest distance between any two reads.
    #[must_use]
    pub fn spread(&self) -> u16 {
        let max = self.reads.iter().max().copied().unwrap_or(0);
        let min = self.reads.iter().min().copied().unwrap_or(0);
        max - min
    }

    #[must_use]
    pub fn reads(&self) -> &[u16] {
        &self.reads
    }
}

#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogSampler {
    context: SampleContext,
}

impl AnalogSampler {
    pub fn set_context(&mut self, context: SampleContext) {
        self.context = context;
    }

    #[must_use]
    pub fn context(&self) -> SampleContext {
        self.context
    }

    pub fn sample<A: ProbeAdc>(&mut self, adc: &mut A) -> Sample {
        let mut reads = [0; MAX_READS];
        let count = self.context.reads();
        for read in reads.iter_mut().take(count) {
            *read = adc.read();
        }
        Sample::from_reads(&reads[..count])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAdc;

    #[test]
    fn when_sampling_rows_it_takes_four_reads() {
        let mut adc = MockAdc::cycling(&[10, 20, 30, 40, 1000]);
        let sample = AnalogSampler::default().sample(&mut adc);
        assert_eq!(sample.reads(), &[10, 20, 30, 40]);
        assert_eq!(sample.mean(), 25);
        assert_eq!(adc.reads_taken(), 4);
    }

    #[test]
    fn when_sampling_pads_it_takes_more_reads() {
        let mut adc = MockAdc::cycling(&[100]);
        let mut sampler = AnalogSampler::default();
        sampler.set_context(SampleContext::Pads);
        let sample = sampler.sample(&mut adc);
        assert_eq!(sample.reads().len(), MAX_READS);
    }

    #[test]
    fn mean_is_truncated() {
        assert_eq!(Sample::from_reads(&[2001, 2001, 1998, 2001]).mean(), 2000);
        assert_eq!(Sample::from_reads(&[50, 52, 49]).mean(), 50);
    }

    #[test]
    fn spread_is_distance_of_extremes() {
        assert_eq!(Sample::from_reads(&[2001, 2001, 1998]).spread(), 3);
        assert_eq!(Sample::from_reads(&[]).spread(), 0);
        assert_eq!(Sample::from_reads(&[]).mean(), 0);
    }
}
