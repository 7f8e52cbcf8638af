use std::sync::Arc;


/// Server configuration
///
/// Create with `Config::new()`, adjust with the builder methods and
/// freeze with `done()`:
///
/// ```rust
/// # use tk_reactor::Config;
/// let cfg = Config::new().port(0).max_line_length(4096).done();
/// assert_eq!(cfg.max_line_length, 4096);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Host (IP address) to bind
    pub host: String,
    /// Port to bind, zero means an ephemeral port
    pub port: u16,
    /// Size of the read scratch buffer shared by all connections
    pub read_buffer_size: usize,
    /// Size of the write scratch buffer shared by all connections
    pub write_buffer_size: usize,
    /// Maximum length of a request line, header line or chunk size line
    pub max_line_length: usize,
    /// Maximum size of a request body
    pub max_body_length: u64,
    /// Maximum payload of a websocket frame and of an assembled message
    pub max_frame_length: u64,
    /// Queued output bytes at which encoders are paused
    pub output_high_watermark: usize,
    /// Reject websocket frames that are not masked by the client
    pub require_masked_frames: bool,
    /// Maximum number of readiness events processed per poll
    pub events_capacity: usize,
}

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            host: String::from("127.0.0.1"),
            port: 8080,
            read_buffer_size: 16 << 10,
            write_buffer_size: 16 << 10,
            max_line_length: 8 << 10,
            max_body_length: 10 << 20,
            max_frame_length: 10 << 20,
            output_high_watermark: 256 << 10,
            require_masked_frames: true,
            events_capacity: 1024,
        }
    }
    /// Host to listen on
    pub fn host<S: Into<String>>(&mut self, value: S) -> &mut Self {
        self.host = value.into();
        self
    }
    /// Port to listen on
    pub fn port(&mut self, value: u16) -> &mut Self {
        self.port = value;
        self
    }
    /// Size of the buffer used for a single `read()` call
    pub fn read_buffer_size(&mut self, value: usize) -> &mut Self {
        assert!(value > 0, "read buffer can't be empty");
        self.read_buffer_size = value;
        self
    }
    /// Size of the buffer used for a single `write()` call
    pub fn write_buffer_size(&mut self, value: usize) -> &mut Self {
        assert!(value > 0, "write buffer can't be empty");
        self.write_buffer_size = value;
        self
    }
    /// Maximum length of the request line and of each header line
    ///
    /// Longer request line is responded with 414, longer header with 431.
    pub fn max_line_length(&mut self, value: usize) -> &mut Self {
        self.max_line_length = value;
        self
    }
    /// Maximum request body size (both fixed and chunked)
    pub fn max_body_length(&mut self, value: u64) -> &mut Self {
        self.max_body_length = value;
        self
    }
    /// Maximum websocket frame payload
    pub fn max_frame_length(&mut self, value: u64) -> &mut Self {
        self.max_frame_length = value;
        self
    }
    /// Number of bytes in the write queue at which no more output is
    /// produced until the socket drains
    pub fn output_high_watermark(&mut self, value: usize) -> &mut Self {
        self.output_high_watermark = value;
        self
    }
    /// Whether unmasked websocket frames from clients are rejected
    pub fn require_masked_frames(&mut self, value: bool) -> &mut Self {
        self.require_masked_frames = value;
        self
    }
    /// Capacity of the readiness events list
    pub fn events_capacity(&mut self, value: usize) -> &mut Self {
        assert!(value > 0, "events capacity can't be zero");
        self.events_capacity = value;
        self
    }
    /// Address in the `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.address(), "127.0.0.1:8080");
        assert_eq!(cfg.read_buffer_size, 16384);
        assert_eq!(cfg.max_body_length, 10485760);
        assert!(cfg.require_masked_frames);
    }

    #[test]
    fn builder() {
        let cfg = Config::new().host("0.0.0.0").port(0)
            .output_high_watermark(100).done();
        assert_eq!(cfg.address(), "0.0.0.0:0");
        assert_eq!(cfg.output_high_watermark, 100);
    }
}
