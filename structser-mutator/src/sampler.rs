use crate::random::RandomSource;

// https://en.wikipedia.org/wiki/Reservoir_sampling#Algorithm_A-Chao
pub struct ChaoSampler<T> {
    current_sample: Option<T>,
    total_weight: u64,
}

impl<T> ChaoSampler<T> {
    pub fn new() -> Self {
        Self {
            current_sample: None,
            total_weight: 0,
        }
    }

    pub fn add(&mut self, rand: &mut RandomSource, item: T, weight: u64) {
        if weight == 0 {
            return;
        }

        self.total_weight += weight;

        if weight == self.total_weight
            || (rand.uniform(self.total_weight as usize) as u64) < weight
        {
            self.current_sample = Some(item);
        }
    }

    pub fn get_sample(self) -> Option<T> {
        self.current_sample
    }
}

impl<T> Default for ChaoSampler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_chao_sampler_basic() {
        let mut rand = RandomSource::new(42);
        let mut sampler = ChaoSampler::new();
        sampler.add(&mut rand, 1, 1);
        sampler.add(&mut rand, 2, 1);
        sampler.add(&mut rand, 3, 1);
        assert!(sampler.get_sample().is_some());
    }

    #[test]
    fn test_chao_sampler_zero_weight() {
        let mut rand = RandomSource::new(42);
        let mut sampler = ChaoSampler::new();
        sampler.add(&mut rand, 1, 0);
        assert!(sampler.get_sample().is_none());
    }

    #[test]
    fn test_chao_sampler_single_item() {
        let mut rand = RandomSource::new(42);
        let mut sampler = ChaoSampler::new();
        sampler.add(&mut rand, 1, 1);
        assert_eq!(sampler.get_sample(), Some(1));
    }

    #[test]
    fn test_chao_sampler_empty() {
        let sampler = ChaoSampler::<i32>::new();
        assert_eq!(sampler.get_sample(), None);
    }

    #[test]
    fn test_chao_sampler_respects_weights() {
        let mut rand = RandomSource::new(7);
        let mut heavy = 0;
        for _ in 0..1000 {
            let mut sampler = ChaoSampler::new();
            sampler.add(&mut rand, 'a', 1);
            sampler.add(&mut rand, 'b', 9);
            if sampler.get_sample() == Some('b') {
                heavy += 1;
            }
        }
        assert!(heavy > 800, "heavy item picked {heavy} times");
    }
}
