//! Boot scripts travel base64 encoded, the upstream API decodes them before
//! running the script on first boot.
use anyhow::Result;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;

pub fn encode(script: &str) -> String {
    BASE64_STANDARD.encode(script.as_bytes())
}

pub fn decode(encoded: &str) -> Result<String> {
    let bytes = BASE64_STANDARD.decode(encoded.trim())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_utf8() -> Result<()> {
        let script = "#!/bin/bash\necho \"你好, wörld 🚀\" > /root/hello\n";
        let encoded = encode(script);
        assert!(encoded.is_ascii());
        assert_eq!(decode(&encoded)?, script);
        Ok(())
    }

    #[test]
    fn test_known_value() -> Result<()> {
        assert_eq!(encode("echo hi"), "ZWNobyBoaQ==");
        assert_eq!(decode("ZWNobyBoaQ==\n")?, "echo hi");
        Ok(())
    }

    #[test]
    fn test_invalid_input() {
        assert!(decode("not base64!").is_err());
        // valid base64, invalid utf-8
        assert!(decode(&BASE64_STANDARD.encode([0xff, 0xfe])).is_err());
    }
}
