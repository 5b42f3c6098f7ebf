use rand::Rng;

use bloom_types::ArpMode;

use crate::arp_state::ArpPlayState;
use crate::roll::seeded;

/// Select the pool index for the arp slot `slot`, advancing `arp`.
///
/// `len` is the current pool size; a pool that shrank since the previous slot
/// folds the stored index back into range.
pub fn next_arp_index(arp: &mut ArpPlayState, mode: ArpMode, len: usize, seed: u64, slot: u64) -> usize {
    if len == 0 {
        return 0;
    }
    if len == 1 {
        arp.step_index = Some(0);
        return 0;
    }
    let index = match (mode, arp.step_index.map(|i| i % len)) {
        (ArpMode::Random, _) => seeded(seed, slot).gen_range(0..len),
        (ArpMode::Up | ArpMode::AsPlayed | ArpMode::UpDown, None) => {
            arp.ascending = true;
            0
        }
        (ArpMode::Down | ArpMode::DownUp, None) => {
            arp.ascending = false;
            len - 1
        }
        (ArpMode::Up | ArpMode::AsPlayed, Some(i)) => (i + 1) % len,
        (ArpMode::Down, Some(i)) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        (ArpMode::UpDown | ArpMode::DownUp, Some(i)) => {
            if arp.ascending {
                if i + 1 >= len {
                    arp.ascending = false;
                    len - 2
                } else {
                    i + 1
                }
            } else if i == 0 {
                arp.ascending = true;
                1
            } else {
                i - 1
            }
        }
    };
    arp.step_index = Some(index);
    index
}
