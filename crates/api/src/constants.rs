//! Query parameters, headers and content types shared with the platform.

/// Query parameter flagging a login started from the command line.
pub const PARAM_CLI: &str = "cli";

/// Form field carrying the token, also the keyring key it is stored under.
pub const PARAM_JWT: &str = "jwt";

/// Query parameter carrying the callback URL the login page redirects to.
pub const PARAM_ORIGIN: &str = "origin";

/// Response header carrying the id of a started deployment.
pub const HEADER_X_DEPLOY_ID: &str = "X-Deploy-ID";

pub const CONTENT_TYPE_BYTES: &str = "application/octet-stream";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Path prefix every platform route lives under.
pub const API_PREFIX: &str = "api";
