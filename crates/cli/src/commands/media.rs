//! Media URL normalization command.

use marketlink_client::MediaNormalizer;

use super::{Context, print_line};

/// Print the normalized form of each input, one per line.
pub fn normalize(ctx: &Context, inputs: &[String]) {
    let normalizer = MediaNormalizer::from_config(&ctx.config);
    for input in inputs {
        print_line(&normalizer.normalize(input));
    }
}
