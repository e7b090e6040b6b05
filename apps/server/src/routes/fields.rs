// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Form field catalog endpoint.

use crate::types::FieldsResponse;
use crate::AppState;
use axum::{extract::State, Json};

/// GET /api/v1/fields - Sections, labels and defaults of every form field.
pub async fn list(State(state): State<AppState>) -> Json<FieldsResponse> {
    Json(FieldsResponse::from(state.catalog.as_ref()))
}
