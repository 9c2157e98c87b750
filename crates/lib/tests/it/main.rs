/*! Integration tests for cfgtree.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - node: Tests for path addressing and the Container contract on map and list nodes
 * - convert: Tests for the converter registry, built-in converters and polymorphic lookup
 * - mapper: Tests for section descriptors, convert/fill round trips and failure handling
 * - helpers: Sample sections shared by the modules above
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cfgtree=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod convert;
mod helpers;
mod node;
