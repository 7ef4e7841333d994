//! Askama template filters

// Include compile-time generated asset hashes
include!(concat!(env!("OUT_DIR"), "/asset_hashes.rs"));

/// Append cache-busting hash to static asset URLs.
///
/// Usage in templates:
/// ```html
/// <script src="{{ "/static/js/lumina.js"|asset_url }}"></script>
/// ```
#[askama::filter_fn]
pub fn asset_url(path: impl std::fmt::Display, _: &dyn askama::Values) -> askama::Result<String> {
  let path_str = path.to_string();
  Ok(match path_str.as_str() {
    "/static/js/lumina.js" => format!("{}?v={}", path_str, LUMINA_JS_HASH),
    "/static/css/app.css" => format!("{}?v={}", path_str, APP_CSS_HASH),
    _ => path_str,
  })
}

/// Seconds as `m:ss`
#[askama::filter_fn]
pub fn mmss(seconds: impl std::fmt::Display, _: &dyn askama::Values) -> askama::Result<String> {
  let secs: u64 = seconds.to_string().parse().unwrap_or(0);
  Ok(format_mmss(secs))
}

pub fn format_mmss(secs: u64) -> String {
  format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_mmss() {
    assert_eq!(format_mmss(0), "0:00");
    assert_eq!(format_mmss(75), "1:15");
    assert_eq!(format_mmss(600), "10:00");
  }
}
