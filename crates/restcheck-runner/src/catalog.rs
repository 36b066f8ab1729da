//! Built-in scenarios for the reqres.in demo API

use restcheck_core::http::Method;
use restcheck_core::scenario::{FieldExpectation, Scenario, Suite, SuiteError};
use serde_json::json;

/// Name of the built-in suite.
pub const REQRES_SUITE: &str = "reqres";

/// Every built-in scenario, in execution order.
#[must_use]
pub fn reqres_scenarios() -> Vec<Scenario> {
    let update_body = json!({"name": "morpheus", "job": "zion resident"});
    let updated_fields = || {
        vec![
            FieldExpectation::json("name", "morpheus").described("Expected name to be morpheus."),
            FieldExpectation::json("job", "zion resident")
                .described("Expected job to be zion resident."),
        ]
    };

    vec![
        Scenario::new("list_users_default_page", Method::Get, "/api/users")
            .expect_schema(200, "users"),
        Scenario::new("list_users_second_page", Method::Get, "/api/users")
            .query("page", "2")
            .expect_fields(
                200,
                vec![FieldExpectation::json("page", 2).described("Expected current page to be 2.")],
            ),
        Scenario::new("single_user", Method::Get, "/api/users/2").expect_fields(
            200,
            vec![
                FieldExpectation::json("data.id", 2).described("Expected user ID to be 2."),
                FieldExpectation::json("data.email", "janet.weaver@reqres.in")
                    .described("Expected email to be janet.weaver@reqres.in."),
                FieldExpectation::json("data.first_name", "Janet")
                    .described("Expected first name to be Janet."),
                FieldExpectation::json("data.last_name", "Weaver")
                    .described("Expected last name to be Weaver."),
                FieldExpectation::json("data.avatar", "https://reqres.in/img/faces/2-image.jpg")
                    .described("Expected avatar URL to match."),
            ],
        ),
        Scenario::new("user_not_found", Method::Get, "/api/users/23").expect_status(404),
        Scenario::new("list_resources_default_page", Method::Get, "/api/unknown")
            .expect_schema(200, "resources"),
        Scenario::new("single_resource", Method::Get, "/api/unknown/2").expect_fields(
            200,
            vec![
                FieldExpectation::json("data.id", 2).described("Expected resource ID to be 2."),
                FieldExpectation::json("data.name", "fuchsia rose")
                    .described("Expected resource name to be fuchsia rose."),
                FieldExpectation::text("data.year", "2001")
                    .described("Expected resource year to be 2001."),
                FieldExpectation::json("data.color", "#C74375")
                    .described("Expected resource color to be #C74375."),
                FieldExpectation::json("data.pantone_value", "17-2031")
                    .described("Expected pantone value to be 17-2031."),
            ],
        ),
        Scenario::new("resource_not_found", Method::Get, "/api/unknown/23").expect_status(404),
        Scenario::new("create_user", Method::Post, "/api/users")
            .json_body(&json!({"name": "morpheus", "job": "leader"}))
            .expect_fields(
                201,
                vec![
                    FieldExpectation::json("name", "morpheus")
                        .described("Expected name to be morpheus."),
                    FieldExpectation::json("job", "leader").described("Expected job to be leader."),
                ],
            ),
        Scenario::new("update_user", Method::Put, "/api/users/2")
            .json_body(&update_body)
            .expect_fields(200, updated_fields())
            .after("create_user"),
        Scenario::new("patch_user", Method::Patch, "/api/users/2")
            .json_body(&update_body)
            .expect_fields(200, updated_fields())
            .after("update_user"),
        Scenario::new("delete_user", Method::Delete, "/api/users/2")
            .expect_empty(204)
            .after("patch_user"),
    ]
}

/// The built-in suite.
///
/// # Errors
///
/// Returns [`SuiteError`] only if the catalog itself is inconsistent.
pub fn reqres_suite() -> Result<Suite, SuiteError> {
    Suite::new(REQRES_SUITE, reqres_scenarios())
}
