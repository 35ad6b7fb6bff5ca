use serde_json::Value;

/// Walk a dotted path (`user._id`, `roles.0`) through nested objects and
/// arrays. Any missing segment yields `None`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Same as [`lookup`] but renders scalars to a string identifier.
pub fn lookup_id(root: &Value, path: &str) -> Option<String> {
    match lookup(root, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn follows_nested_objects() {
        let creds = json!({"user": {"_id": "abc", "profile": {"age": 3}}});
        assert_eq!(lookup_id(&creds, "user._id").as_deref(), Some("abc"));
        assert_eq!(lookup_id(&creds, "user.profile.age").as_deref(), Some("3"));
    }

    #[test]
    fn indexes_into_arrays() {
        let creds = json!({"scope": ["root", "admin"]});
        assert_eq!(lookup(&creds, "scope.1"), Some(&json!("admin")));
        assert_eq!(lookup(&creds, "scope.x"), None);
    }

    #[test]
    fn missing_segments_are_none() {
        let creds = json!({"user": null});
        assert_eq!(lookup(&creds, "user._id"), None);
        assert_eq!(lookup(&creds, ""), None);
        assert_eq!(lookup_id(&json!({"user": {"_id": ""}}), "user._id"), None);
        assert_eq!(lookup_id(&json!({"user": {"_id": {}}}), "user._id"), None);
    }
}
