use crate::enums::Status;
use super::Response;

const PART1: &'static str = "\
    <!DOCTYPE html>
    <html>\
        <head>\
            <title>\
    ";
const PART2: &'static str = "\
            </title>\
        </head>\
        <body>\
            <h1>\
    ";
const PART3: &'static str = concat!("\
            </h1>\
            <hr>\
            <p>Yours faithfully,<br>\
                tk-reactor/", env!("CARGO_PKG_VERSION"), "\
            </p>
        </body>
    </html>
    ");

/// Generates response with default error page
#[derive(Debug, Clone)]
pub struct SimpleErrorPage(Status);

impl SimpleErrorPage {
    /// Create a simple error page
    pub fn new(status: Status) -> SimpleErrorPage {
        debug_assert!(status.code() >= 400,
            "error page for non-error status {}", status.code());
        SimpleErrorPage(status)
    }
    /// Html of the page
    pub fn body(&self) -> String {
        format!("{p1}{code:03} {status}{p2}{code:03} {status}{p3}",
            code=self.0.code(), status=self.0.reason(),
            p1=PART1, p2=PART2, p3=PART3)
    }
}

impl From<SimpleErrorPage> for Response {
    fn from(page: SimpleErrorPage) -> Response {
        let body = page.body();
        Response::new(page.0)
            .header("Content-Type", "text/html")
            .body(body)
    }
}

#[cfg(test)]
mod test {
    use crate::enums::Status;
    use super::SimpleErrorPage;

    #[test]
    fn page() {
        let body = SimpleErrorPage::new(Status::NotFound).body();
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<title>404 Not Found</title>"));
        assert!(body.contains("<h1>404 Not Found</h1>"));
    }
}
