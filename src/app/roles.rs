/// Root roles a user can hold, by the name Terraform uses.
pub const ROOT_ROLES: &[&str] = &["Admin", "Editor", "Viewer"];

/// Unleash id of a root role name; 0 for anything unknown.
pub fn role_id(name: &str) -> i64 {
    match name {
        "Admin" => 1,
        "Editor" => 2,
        "Viewer" => 3,
        _ => 0,
    }
}

/// Name of a root role id; empty for custom or unknown roles.
pub fn role_name(id: i64) -> &'static str {
    match id {
        1 => "Admin",
        2 => "Editor",
        3 => "Viewer",
        _ => "",
    }
}
