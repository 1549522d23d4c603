use rand::Rng;

use crate::token::Token;

const BASE: u64 = 257;
const MOD_P: u64 = 1000000009;

#[derive(Clone, Copy, Debug)]
pub(super) struct HashFunctionParams {
    pub mod_p: u64,
    pub factor: u64,
}

impl HashFunctionParams {
    pub fn random() -> HashFunctionParams {
        let mut rng = rand::thread_rng();
        HashFunctionParams {
            mod_p: MOD_P,
            factor: rng.gen_range(1..MOD_P),
        }
    }
}

/// Rolling hash of every window of `window` token types.
///
/// Entry `i` covers `tokens[i..i + window]`. It is `None` when any token of the window is marked,
/// such a window can never start a tile.
pub(super) fn window_hashes(
    tokens: &[Token],
    marks: &[bool],
    window: usize,
    f: &HashFunctionParams,
) -> Vec<Option<u64>> {
    debug_assert_eq!(tokens.len(), marks.len());
    if window == 0 || tokens.len() < window {
        return vec![];
    }

    let mut base_power_window = 1;
    for _ in 0..window {
        base_power_window = (base_power_window * BASE) % f.mod_p;
    }

    let mut prefix_values = vec![0];
    let mut marked_prefix = vec![0];
    let mut current_prefix_value = 0;
    let mut hashes = vec![];
    for i in 0..tokens.len() {
        current_prefix_value *= BASE;
        current_prefix_value += u64::from(tokens[i].token_type.0) + 1;
        current_prefix_value %= f.mod_p;
        prefix_values.push(current_prefix_value);
        marked_prefix.push(marked_prefix[i] + usize::from(marks[i]));

        if i + 1 >= window {
            let start = i + 1 - window;
            if marked_prefix[i + 1] != marked_prefix[start] {
                hashes.push(None);
                continue;
            }
            let value = (current_prefix_value + f.mod_p - (prefix_values[start] * base_power_window) % f.mod_p) % f.mod_p;
            hashes.push(Some((value * f.factor) % f.mod_p));
        }
    }
    hashes
}

/// Window start positions grouped by hash, for looking up candidate tile starts.
#[derive(Clone, Debug)]
pub struct TokenHashes {
    starts_by_hash: Vec<Vec<(usize, u64)>>,
}

impl TokenHashes {
    pub(super) fn build(hashes: &[Option<u64>]) -> TokenHashes {
        let table_size = hashes.len().max(1);
        let mut starts_by_hash = vec![vec![]; table_size];
        for (start, hash) in hashes.iter().enumerate() {
            if let Some(hash) = *hash {
                starts_by_hash[bucket(hash, table_size)].push((start, hash));
            }
        }
        TokenHashes { starts_by_hash }
    }

    /// Starts of all windows with the given hash, in ascending order.
    pub(super) fn starts(&self, hash: u64) -> impl Iterator<Item = usize> + '_ {
        self.starts_by_hash[bucket(hash, self.starts_by_hash.len())]
            .iter()
            .filter(move |&&(_, start_hash)| start_hash == hash)
            .map(|&(start, _)| start)
    }
}

fn bucket(hash: u64, table_size: usize) -> usize {
    (hash % table_size as u64) as usize
}

#[cfg(test)]
mod test {
    use super::{window_hashes, HashFunctionParams, TokenHashes};
    use crate::token::Token;

    #[test]
    fn equal_windows_hash_equally() {
        let f = HashFunctionParams::random();
        let tokens = Token::sequence_of(&[2, 3, 4, 2, 3, 4, 5]);
        let hashes = window_hashes(&tokens, &[false; 7], 3, &f);
        assert_eq!(hashes.len(), 5);
        assert_eq!(hashes[0], hashes[3]);
        assert_ne!(hashes[0], hashes[1]);
        assert!(hashes.iter().all(Option::is_some));
    }

    #[test]
    fn marked_windows_have_no_hash() {
        let f = HashFunctionParams::random();
        let tokens = Token::sequence_of(&[2, 3, 4, 5, 6]);
        let marks = [false, false, true, false, false];
        let hashes = window_hashes(&tokens, &marks, 2, &f);
        assert_eq!(hashes, vec![hashes[0], None, None, hashes[3]]);
        assert!(hashes[0].is_some() && hashes[3].is_some());
    }

    #[test]
    fn short_sequence() {
        let f = HashFunctionParams::random();
        let tokens = Token::sequence_of(&[2, 3]);
        assert!(window_hashes(&tokens, &[false; 2], 3, &f).is_empty());
    }

    #[test]
    fn lookup_is_ascending() {
        let f = HashFunctionParams::random();
        let tokens = Token::sequence_of(&[7, 8, 7, 8, 7, 8]);
        let hashes = window_hashes(&tokens, &[false; 6], 2, &f);
        let table = TokenHashes::build(&hashes);
        let starts: Vec<usize> = table.starts(hashes[0].unwrap()).collect();
        assert_eq!(starts, vec![0, 2, 4]);
    }
}
