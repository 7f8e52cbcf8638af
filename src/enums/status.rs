/// Enum with some HTTP Status codes.
///
/// Use `Status::Raw` for codes (or reason phrases) not listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    // custom http code
    Raw(u16, String),
    //  1xx status codes
    Continue,                       // 100
    SwitchingProtocol,              // 101
    //  2xx status codes
    Ok,                             // 200
    Created,                        // 201
    Accepted,                       // 202
    NoContent,                      // 204
    PartialContent,                 // 206
    //  3xx status codes
    MovedPermanently,               // 301
    Found,                          // 302
    SeeOther,                       // 303
    NotModified,                    // 304
    TemporaryRedirect,              // 307
    PermanentRedirect,              // 308
    //  4xx status codes
    BadRequest,                     // 400
    Unauthorized,                   // 401
    Forbidden,                      // 403
    NotFound,                       // 404
    MethodNotAllowed,               // 405
    RequestTimeout,                 // 408
    LengthRequired,                 // 411
    RequestEntityTooLarge,          // 413
    RequestURITooLong,              // 414
    UpgradeRequired,                // 426
    TooManyRequests,                // 429
    RequestHeaderFieldsTooLarge,    // 431
    //  5xx status codes
    InternalServerError,            // 500
    NotImplemented,                 // 501
    ServiceUnavailable,             // 503
    VersionNotSupported,            // 505
}

impl Status {
    /// Numeric status code
    pub fn code(&self) -> u16 {
        use self::Status::*;
        match *self {
            Continue                    => 100,
            SwitchingProtocol           => 101,
            Ok                          => 200,
            Created                     => 201,
            Accepted                    => 202,
            NoContent                   => 204,
            PartialContent              => 206,
            MovedPermanently            => 301,
            Found                       => 302,
            SeeOther                    => 303,
            NotModified                 => 304,
            TemporaryRedirect           => 307,
            PermanentRedirect           => 308,
            BadRequest                  => 400,
            Unauthorized                => 401,
            Forbidden                   => 403,
            NotFound                    => 404,
            MethodNotAllowed            => 405,
            RequestTimeout              => 408,
            LengthRequired              => 411,
            RequestEntityTooLarge       => 413,
            RequestURITooLong           => 414,
            UpgradeRequired             => 426,
            TooManyRequests             => 429,
            RequestHeaderFieldsTooLarge => 431,
            InternalServerError         => 500,
            NotImplemented              => 501,
            ServiceUnavailable          => 503,
            VersionNotSupported         => 505,
            Raw(code, _) => code,
        }
    }

    /// Reason phrase written into the status line
    pub fn reason(&self) -> &str {
        use self::Status::*;
        match *self {
            Continue                    => "Continue",
            SwitchingProtocol           => "Switching Protocols",
            Ok                          => "OK",
            Created                     => "Created",
            Accepted                    => "Accepted",
            NoContent                   => "No Content",
            PartialContent              => "Partial Content",
            MovedPermanently            => "Moved Permanently",
            Found                       => "Found",
            SeeOther                    => "See Other",
            NotModified                 => "Not Modified",
            TemporaryRedirect           => "Temporary Redirect",
            PermanentRedirect           => "Permanent Redirect",
            BadRequest                  => "Bad Request",
            Unauthorized                => "Unauthorized",
            Forbidden                   => "Forbidden",
            NotFound                    => "Not Found",
            MethodNotAllowed            => "Method Not Allowed",
            RequestTimeout              => "Request Timeout",
            LengthRequired              => "Length Required",
            RequestEntityTooLarge       => "Request Entity Too Large",
            RequestURITooLong           => "Request-URI Too Long",
            UpgradeRequired             => "Upgrade Required",
            TooManyRequests             => "Too Many Requests",
            RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            InternalServerError         => "Internal Server Error",
            NotImplemented              => "Not Implemented",
            ServiceUnavailable          => "Service Unavailable",
            VersionNotSupported         => "HTTP Version Not Supported",
            Raw(_, ref reason) => reason,
        }
    }

    /// Returns false for statuses that never carry a message body:
    /// 1xx, 204 and 304
    pub fn has_body(&self) -> bool {
        let code = self.code();
        !((code >= 100 && code < 200) || code == 204 || code == 304)
    }
}
