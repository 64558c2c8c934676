// Copyright 2026 the Lineflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout tests against the deterministic test font backend.

mod test_basic;
mod test_bidi;
mod test_ellipsize;
mod test_hyphen;
mod test_mapping;
mod test_tabs;
mod test_undo;
mod utils;
