/// Error code registry for apid
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Template errors
/// - 4000-4999: Execution errors
/// - 5000-5999: HTTP errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_INVALID_JSON: u16 = 1003;
    pub const CONFIG_UNSUPPORTED_FORMAT: u16 = 1004;
    pub const CONFIG_TRANSACTION_NOT_FOUND: u16 = 1005;

    // Template errors (2000-2999)
    pub const TEMPLATE_GENERIC: u16 = 2000;
    pub const TEMPLATE_SYNTAX: u16 = 2001;
    pub const TEMPLATE_UNKNOWN_VARIABLE: u16 = 2002;
    pub const TEMPLATE_COMMAND_FAILED: u16 = 2003;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_TIMEOUT: u16 = 4002;
    pub const EXEC_EMPTY_COMMAND: u16 = 4003;
    pub const EXEC_SPAWN_FAILED: u16 = 4007;
    pub const EXEC_OUTPUT_ERROR: u16 = 4008;

    // HTTP errors (5000-5999)
    pub const HTTP_GENERIC: u16 = 5000;
    pub const HTTP_INVALID_REQUEST: u16 = 5001;
    pub const HTTP_DNS_FAILED: u16 = 5002;
    pub const HTTP_CONNECT_FAILED: u16 = 5003;
    pub const HTTP_TLS_FAILED: u16 = 5004;
    pub const HTTP_PROTOCOL_ERROR: u16 = 5005;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_FAILED: u16 = 7001;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Configuration errors
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Invalid YAML syntax in configuration",
        1003 => "Invalid JSON syntax in configuration",
        1004 => "Unsupported configuration file format",
        1005 => "Transaction not found in configuration",

        // Template errors
        2000 => "Generic template error",
        2001 => "Unterminated template expression",
        2002 => "Template references an unknown variable",
        2003 => "Template command failed",

        // Execution errors
        4000 => "Generic execution error",
        4001 => "Command not found",
        4002 => "Command execution timeout",
        4003 => "Empty command",
        4007 => "Failed to spawn subprocess",
        4008 => "Command output error",

        // HTTP errors
        5000 => "Generic HTTP error",
        5001 => "Invalid HTTP request",
        5002 => "DNS lookup failed",
        5003 => "TCP connection failed",
        5004 => "TLS handshake failed",
        5005 => "HTTP protocol error",

        // Validation errors
        7000 => "Generic validation error",
        7001 => "Configuration failed structural validation",

        // Other errors
        9000 => "Generic error",

        _ => "Unknown error code",
    }
}
