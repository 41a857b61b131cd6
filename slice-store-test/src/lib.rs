/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Test support for Slice Store.
//!
//! Import the prelude and annotate `async fn` tests with `#[store_test]`:
//!
//! ```rust,ignore
//! use slice_store_test::prelude::*;
//!
//! #[store_test]
//! async fn counts() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

/// Re-exports for test files.
pub mod prelude {
    pub use slice_store_test_macro::store_test;
}

/// Crates referenced by the code `#[store_test]` expands to. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}
