pub mod error;
pub mod ipc;
pub mod protocol;

pub use error::ClipqError;
pub use protocol::{ControlRequest, ControlResponse, StatusInfo};

/// Get the named pipe path of the clipq daemon for the current user.
pub fn pipe_name() -> String {
    let username = std::env::var("USERNAME").unwrap_or_else(|_| "default".to_string());
    format!(r"\\.\pipe\clipq-{}", username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_name_is_per_user() {
        let name = pipe_name();
        assert!(name.starts_with(r"\\.\pipe\clipq-"));
        assert!(name.len() > r"\\.\pipe\clipq-".len());
    }
}
