// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type definitions for API requests.
//!
//! Response bodies are the pipeline's own wire types
//! ([`geolayers_processing::LayersResponse`]).

mod request;

pub use request::ToLayersRequest;
