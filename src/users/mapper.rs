use super::dto::{UserRequest, UserResponse};
use super::repo_types::{NewUser, User, UserPatch};

/// Request → new entity. Expects a request that passed `validate_create`.
pub fn to_entity(req: &UserRequest) -> NewUser {
    NewUser {
        name: req.name.clone().unwrap_or_default(),
        email: req.email.clone().unwrap_or_default(),
        age: req.age.unwrap_or_default(),
    }
}

/// Request → partial update. Blank strings count as "not supplied".
pub fn to_patch(req: UserRequest) -> UserPatch {
    UserPatch {
        name: req.name.filter(|s| !s.trim().is_empty()),
        email: req.email.filter(|s| !s.trim().is_empty()),
        age: req.age,
    }
}

pub fn to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        age: user.age,
        created_at: user.created_at,
    }
}

/// Applies the supplied fields of `patch` onto `user`. `id` and `created_at` are left alone.
pub fn update_entity(patch: &UserPatch, user: &mut User) {
    if let Some(name) = &patch.name {
        user.name = name.clone();
    }
    if let Some(email) = &patch.email {
        user.email = email.clone();
    }
    if let Some(age) = patch.age {
        user.age = age;
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        to_response(&user)
    }
}
