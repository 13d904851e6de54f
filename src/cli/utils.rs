use serde_json::Value;

/// Parses a `key=value` queue directive. Values that read as JSON (numbers,
/// booleans, lists) keep their type, anything else is taken as text.
pub fn parse_option(s: &str) -> Result<(String, Value), String> {
  let (key, raw) = s
    .split_once('=')
    .ok_or_else(|| format!("invalid option \"{}\", expected key=value", s))?;
  let key = key.trim();
  if key.is_empty() {
    return Err(format!("invalid option \"{}\", the key is empty", s));
  }
  let value = match serde_json::from_str::<Value>(raw) {
    Ok(Value::String(_)) | Err(_) => Value::String(raw.to_string()),
    Ok(value) => value,
  };
  Ok((key.to_string(), value))
}
