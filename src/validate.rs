use tracing::error;

use crate::{comparison::Comparison, token::Token};

/// Checks that the tiles of a comparison are consistent with the token sequences they were found in.
///
/// `tokens` are the sequences of the first and second submission of the comparison.
pub fn validate(comparison: &Comparison, tokens: [&[Token]; 2], minimum_match_length: usize) -> Vec<String> {
    let mut errors = vec![];
    let names = comparison.names();

    fn side_str(names: [&str; 2], side: usize) -> String {
        let side_name = ["First", "Second"][side];
        format!("{side_name} submission ({})", names[side])
    }

    // Each tile should lie within both sequences.
    for (index, tile) in comparison.matches().iter().enumerate() {
        for side in 0..2 {
            if tile.range(side).end > tokens[side].len() {
                errors.push(format!(
                    "Tile {index} covers {:?}, but {} has only {} tokens",
                    tile.range(side),
                    side_str(names, side),
                    tokens[side].len()
                ));
            }
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    // Each tile should be at least the minimum match length long.
    for (index, tile) in comparison.matches().iter().enumerate() {
        if tile.length < minimum_match_length {
            errors.push(format!(
                "Tile {index} has length {}, shorter than the minimum match length {minimum_match_length}",
                tile.length
            ));
        }
    }

    // Tiles should pair tokens of equal type and never cover a reserved token.
    for (index, tile) in comparison.matches().iter().enumerate() {
        for offset in 0..tile.length {
            let pair = [0, 1].map(|side| tokens[side][tile.starts[side] + offset]);
            if pair[0].token_type != pair[1].token_type {
                errors.push(format!(
                    "Tile {index} pairs {:?} with {:?} at offset {offset}",
                    pair[0].token_type, pair[1].token_type
                ));
            }
            for side in 0..2 {
                if pair[side].token_type.is_reserved() {
                    errors.push(format!(
                        "Tile {index} covers reserved token {:?} of {}",
                        pair[side].token_type,
                        side_str(names, side)
                    ));
                }
            }
        }
    }

    // Tiles should not overlap on either side.
    for (i, first) in comparison.matches().iter().enumerate() {
        for (j, second) in comparison.matches().iter().enumerate().skip(i + 1) {
            if first.overlaps(second) {
                errors.push(format!("Tiles {i} and {j} overlap"));
            }
        }
    }

    // Matched tokens can't exceed what either side has to offer.
    let matched = comparison.matched_tokens();
    for side in 0..2 {
        if matched > comparison.lengths()[side] {
            errors.push(format!(
                "{} has {} comparable tokens, but {matched} are matched",
                side_str(names, side),
                comparison.lengths()[side]
            ));
        }
    }

    errors
}

pub fn report_errors(errors: &[String]) {
    if !errors.is_empty() {
        error!("Comparison validation errors:");
        for message in errors {
            error!("  {message}");
        }
    }
}
