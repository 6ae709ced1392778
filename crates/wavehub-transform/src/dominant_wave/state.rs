//! Cross-call state the dominant-wave transform carries between `update`
//! calls: the chronological price buffer, the last bar timestamp (for the
//! intra-bar-update vs. new-bar tie-break), and the phase-continuity carry.

#[derive(Debug, Clone, Default)]
pub struct DominantWaveState {
    pub prices: Vec<f64>,
    pub last_bar_ts: Option<i64>,
    pub phase_cont: Option<f64>,
    pub z_prev: Option<(f64, f64)>,
}

impl DominantWaveState {
    pub fn reset(&mut self) {
        self.prices.clear();
        self.last_bar_ts = None;
        self.phase_cont = None;
        self.z_prev = None;
    }

    /// Applies a FULL window: replaces the buffer and re-seeds the phase
    /// carry (a FULL window supersedes history).
    pub fn apply_full(&mut self, chronological: &[f64], ts: i64) {
        self.prices = chronological.to_vec();
        self.last_bar_ts = Some(ts);
        self.phase_cont = None;
        self.z_prev = None;
    }

    /// Applies one UPDATE tick: replaces the last bar if `ts` matches the
    /// stored timestamp (intra-bar update), else pushes a new bar shifting
    /// the buffer by one. A new bar beyond `max_keep` drops the oldest bar,
    /// keeping the buffer (and the per-update STFT cost) bounded under
    /// sustained UPDATE traffic with no intervening FULL.
    pub fn apply_update(&mut self, price: f64, ts: i64, max_keep: usize) {
        match self.last_bar_ts {
            Some(last_ts) if last_ts == ts => {
                if let Some(last) = self.prices.last_mut() {
                    *last = price;
                } else {
                    self.prices.push(price);
                }
            }
            _ => {
                self.prices.push(price);
                if self.prices.len() > max_keep {
                    let excess = self.prices.len() - max_keep;
                    self.prices.drain(0..excess);
                }
            }
        }
        self.last_bar_ts = Some(ts);
    }

    /// Updates the phase-continuity carry from an end-centered observation
    /// Zero magnitude passes through unchanged.
    pub fn advance_phase(&mut self, amp_end: f64, phi_end_raw: f64) {
        let z_now = (amp_end * phi_end_raw.cos(), amp_end * phi_end_raw.sin());
        if amp_end <= 0.0 {
            return;
        }
        match (self.phase_cont, self.z_prev) {
            (None, _) => {
                self.phase_cont = Some(phi_end_raw);
                self.z_prev = Some(z_now);
            }
            (Some(phi_cont), Some((zp_re, zp_im))) => {
                let conj = (zp_re, -zp_im);
                let prod = (z_now.0 * conj.0 - z_now.1 * conj.1, z_now.0 * conj.1 + z_now.1 * conj.0);
                let dphi = prod.1.atan2(prod.0);
                self.phase_cont = Some(phi_cont + dphi);
                self.z_prev = Some(z_now);
            }
            (Some(_), None) => {
                self.phase_cont = Some(phi_end_raw);
                self.z_prev = Some(z_now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_same_ts_replaces_last_bar() {
        let mut state = DominantWaveState::default();
        state.apply_full(&[1.0, 2.0, 3.0], 100);
        state.apply_update(3.5, 100, 4_096);
        assert_eq!(state.prices, vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn update_with_new_ts_pushes_new_bar() {
        let mut state = DominantWaveState::default();
        state.apply_full(&[1.0, 2.0, 3.0], 100);
        state.apply_update(4.0, 101, 4_096);
        assert_eq!(state.prices, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(state.last_bar_ts, Some(101));
    }

    #[test]
    fn update_beyond_max_keep_drops_oldest_bar() {
        let mut state = DominantWaveState::default();
        state.apply_full(&[1.0, 2.0, 3.0], 100);
        state.apply_update(4.0, 101, 3);
        assert_eq!(state.prices, vec![2.0, 3.0, 4.0]);
        state.apply_update(5.0, 102, 3);
        assert_eq!(state.prices, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn full_reseeds_phase_carry() {
        let mut state = DominantWaveState::default();
        state.advance_phase(1.0, 0.5);
        assert!(state.phase_cont.is_some());
        state.apply_full(&[1.0], 0);
        assert!(state.phase_cont.is_none());
        assert!(state.z_prev.is_none());
    }
}
