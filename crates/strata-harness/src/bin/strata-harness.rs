// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for the determinism harness.

use anyhow::Result;
use strata_harness::drill::entrypoint;

fn main() -> Result<()> {
    entrypoint()
}
