// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use serde::Deserialize;
use studiox_core::FieldValues;

/// Multipart field carrying the gbXML document.
pub const GBXML_FIELD: &str = "gbxml";

/// Query options for simulation requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulateOptions {
    /// Skip cache lookup if true.
    #[serde(default)]
    pub skip_cache: bool,
}

/// A decoded simulation form: the document plus every other text field.
#[derive(Debug, Clone, Default)]
pub struct SimulationUpload {
    pub gbxml: Vec<u8>,
    pub values: FieldValues,
}
