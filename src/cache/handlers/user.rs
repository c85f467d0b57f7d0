use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::handlers::{HandlerResult, UserHandler};
use crate::cache::core::{CacheCore, InnerCall};
use crate::cache::identifier::{Arg, KeyKind, TagKind};
use crate::domain::Id;
use crate::domain::user::{
    Policy, Role, RoleAssignment, RoleCreateStruct, RoleUpdateStruct, User, UserTokenUpdateStruct,
};

pub struct UserCacheHandler {
    inner: Arc<dyn UserHandler>,
    core: Arc<CacheCore>,
}

impl UserCacheHandler {
    pub fn new(inner: Arc<dyn UserHandler>, core: Arc<CacheCore>) -> Self {
        Self { inner, core }
    }

    fn user_tags(&self, user_id: Id) -> [String; 2] {
        [
            self.core.tag(TagKind::Content, &[user_id.into()]),
            self.core.tag(TagKind::User, &[user_id.into()]),
        ]
    }

    fn email_tag(&self, email: &str) -> String {
        self.core.tag(TagKind::UserByEmail, &[Arg::text(email)])
    }

    fn role_tags(&self, role: &Role) -> Vec<String> {
        let mut tags = vec![self.core.tag(TagKind::Role, &[role.id.into()])];
        tags.extend(
            role.policies
                .iter()
                .map(|policy| self.core.tag(TagKind::Policy, &[policy.id.into()])),
        );
        tags
    }

    fn assignment_tags(&self, assignment: &RoleAssignment) -> Vec<String> {
        vec![
            self.core
                .tag(TagKind::RoleAssignment, &[assignment.id.into()]),
            self.core.tag(
                TagKind::RoleAssignmentGroupList,
                &[assignment.content_id.into()],
            ),
            self.core
                .tag(TagKind::RoleAssignmentRoleList, &[assignment.role_id.into()]),
        ]
    }

    fn inherited_tag(&self) -> String {
        self.core.tag(TagKind::RoleAssignmentInherited, &[])
    }
}

#[async_trait]
impl UserHandler for UserCacheHandler {
    async fn create(&self, user: User) -> HandlerResult<User> {
        let user_id = user.id;
        let email_tag = self.email_tag(&user.email);
        self.core
            .mutate(
                InnerCall::new(
                    "user::create",
                    json!({ "user": user_id, "login": user.login }),
                ),
                self.inner.create(user),
                |_| {
                    let mut tags = self.user_tags(user_id).to_vec();
                    tags.push(email_tag);
                    tags
                },
            )
            .await
    }

    async fn load(&self, user_id: Id) -> HandlerResult<User> {
        self.core
            .get_cached(
                self.core.key(KeyKind::User, &[user_id.into()]),
                InnerCall::new("user::load", json!({ "user": user_id })),
                self.inner.load(user_id),
                |user| self.user_tags(user.id).to_vec(),
            )
            .await
    }

    async fn load_by_login(&self, login: &str) -> HandlerResult<User> {
        self.core
            .get_cached(
                self.core.key(KeyKind::UserByLogin, &[Arg::text(login)]),
                InnerCall::new("user::load_by_login", json!({ "login": login })),
                self.inner.load_by_login(login),
                |user| self.user_tags(user.id).to_vec(),
            )
            .await
    }

    async fn load_users_by_email(&self, email: &str) -> HandlerResult<Vec<User>> {
        self.core
            .get_cached(
                self.core.key(KeyKind::UserByEmail, &[Arg::text(email)]),
                InnerCall::new("user::load_users_by_email", json!({ "email": email })),
                self.inner.load_users_by_email(email),
                |users| {
                    let mut tags = vec![self.email_tag(email)];
                    for user in users {
                        tags.extend(self.user_tags(user.id));
                    }
                    tags
                },
            )
            .await
    }

    async fn load_user_by_token(&self, hash: &str) -> HandlerResult<User> {
        self.core
            .get_cached(
                self.core.key(KeyKind::UserByAccountKey, &[Arg::text(hash)]),
                InnerCall::new("user::load_user_by_token", json!({ "hash": hash })),
                self.inner.load_user_by_token(hash),
                |user| {
                    let mut tags = self.user_tags(user.id).to_vec();
                    tags.push(self.core.tag(TagKind::UserAccountKey, &[user.id.into()]));
                    tags.push(self.core.tag(TagKind::UserByAccountKey, &[Arg::text(hash)]));
                    tags
                },
            )
            .await
    }

    async fn update(&self, user: User) -> HandlerResult<User> {
        let user_id = user.id;
        let email_tag = self.email_tag(&user.email);
        self.core
            .mutate(
                InnerCall::new("user::update", json!({ "user": user_id })),
                self.inner.update(user),
                |_| {
                    let mut tags = self.user_tags(user_id).to_vec();
                    tags.push(email_tag);
                    tags
                },
            )
            .await
    }

    async fn update_user_token(&self, input: UserTokenUpdateStruct) -> HandlerResult<()> {
        let user_id = input.user_id;
        self.core
            .mutate(
                InnerCall::new(
                    "user::update_user_token",
                    json!({ "user": user_id, "time": input.time }),
                ),
                self.inner.update_user_token(input),
                |_| vec![self.core.tag(TagKind::UserAccountKey, &[user_id.into()])],
            )
            .await
    }

    async fn expire_user_token(&self, hash: &str) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("user::expire_user_token", json!({ "hash": hash })),
                self.inner.expire_user_token(hash),
                |_| vec![self.core.tag(TagKind::UserByAccountKey, &[Arg::text(hash)])],
            )
            .await
    }

    async fn delete(&self, user_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("user::delete", json!({ "user": user_id })),
                self.inner.delete(user_id),
                |_| self.user_tags(user_id).to_vec(),
            )
            .await
    }

    async fn create_role(&self, input: RoleCreateStruct) -> HandlerResult<Role> {
        self.core
            .passthrough(
                InnerCall::new("user::create_role", json!({ "identifier": input.identifier })),
                self.inner.create_role(input),
            )
            .await
    }

    async fn load_role(&self, role_id: Id) -> HandlerResult<Role> {
        self.core
            .get_cached(
                self.core.key(KeyKind::Role, &[role_id.into()]),
                InnerCall::new("user::load_role", json!({ "role": role_id })),
                self.inner.load_role(role_id),
                |role| self.role_tags(role),
            )
            .await
    }

    async fn load_role_by_identifier(&self, identifier: &str) -> HandlerResult<Role> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::RoleByIdentifier, &[Arg::text(identifier)]),
                InnerCall::new(
                    "user::load_role_by_identifier",
                    json!({ "identifier": identifier }),
                ),
                self.inner.load_role_by_identifier(identifier),
                |role| self.role_tags(role),
            )
            .await
    }

    async fn load_roles(&self) -> HandlerResult<Vec<Role>> {
        self.core
            .passthrough(
                InnerCall::new("user::load_roles", json!({})),
                self.inner.load_roles(),
            )
            .await
    }

    async fn update_role(&self, input: RoleUpdateStruct) -> HandlerResult<()> {
        let role_id = input.id;
        self.core
            .mutate(
                InnerCall::new("user::update_role", json!({ "struct": input })),
                self.inner.update_role(input),
                |_| vec![self.core.tag(TagKind::Role, &[role_id.into()])],
            )
            .await
    }

    async fn delete_role(&self, role_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new("user::delete_role", json!({ "role": role_id })),
                self.inner.delete_role(role_id),
                |_| {
                    vec![
                        self.core.tag(TagKind::Role, &[role_id.into()]),
                        self.core
                            .tag(TagKind::RoleAssignmentRoleList, &[role_id.into()]),
                    ]
                },
            )
            .await
    }

    async fn add_policy(&self, role_id: Id, policy: Policy) -> HandlerResult<Policy> {
        self.core
            .mutate(
                InnerCall::new(
                    "user::add_policy",
                    json!({ "role": role_id, "module": policy.module, "function": policy.function }),
                ),
                self.inner.add_policy(role_id, policy),
                |_| vec![self.core.tag(TagKind::Role, &[role_id.into()])],
            )
            .await
    }

    async fn update_policy(&self, policy: Policy) -> HandlerResult<Policy> {
        let policy_id = policy.id;
        self.core
            .mutate(
                InnerCall::new("user::update_policy", json!({ "policy": policy_id })),
                self.inner.update_policy(policy),
                |_| vec![self.core.tag(TagKind::Policy, &[policy_id.into()])],
            )
            .await
    }

    async fn delete_policy(&self, policy_id: Id, role_id: Id) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "user::delete_policy",
                    json!({ "policy": policy_id, "role": role_id }),
                ),
                self.inner.delete_policy(policy_id, role_id),
                |_| {
                    vec![
                        self.core.tag(TagKind::Policy, &[policy_id.into()]),
                        self.core.tag(TagKind::Role, &[role_id.into()]),
                    ]
                },
            )
            .await
    }

    async fn load_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<RoleAssignment> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::RoleAssignment, &[role_assignment_id.into()]),
                InnerCall::new(
                    "user::load_role_assignment",
                    json!({ "role_assignment": role_assignment_id }),
                ),
                self.inner.load_role_assignment(role_assignment_id),
                |assignment| self.assignment_tags(assignment),
            )
            .await
    }

    async fn load_role_assignments_by_group_id(
        &self,
        group_id: Id,
        inherit: bool,
    ) -> HandlerResult<Vec<RoleAssignment>> {
        self.core
            .get_cached(
                self.core.key(
                    KeyKind::RoleAssignmentsByGroup,
                    &[group_id.into(), Arg::flag(inherit)],
                ),
                InnerCall::new(
                    "user::load_role_assignments_by_group_id",
                    json!({ "group": group_id, "inherit": inherit }),
                ),
                self.inner
                    .load_role_assignments_by_group_id(group_id, inherit),
                |assignments| {
                    let mut tags = vec![
                        self.core
                            .tag(TagKind::RoleAssignmentGroupList, &[group_id.into()]),
                    ];
                    // Inherited lists depend on group membership we cannot see.
                    if inherit {
                        tags.push(self.inherited_tag());
                    }
                    for assignment in assignments {
                        tags.extend(self.assignment_tags(assignment));
                    }
                    tags
                },
            )
            .await
    }

    async fn load_role_assignments_by_role_id(
        &self,
        role_id: Id,
    ) -> HandlerResult<Vec<RoleAssignment>> {
        self.core
            .get_cached(
                self.core
                    .key(KeyKind::RoleAssignmentsByRole, &[role_id.into()]),
                InnerCall::new(
                    "user::load_role_assignments_by_role_id",
                    json!({ "role": role_id }),
                ),
                self.inner.load_role_assignments_by_role_id(role_id),
                |assignments| {
                    let mut tags = vec![
                        self.core
                            .tag(TagKind::RoleAssignmentRoleList, &[role_id.into()]),
                    ];
                    for assignment in assignments {
                        tags.extend(self.assignment_tags(assignment));
                    }
                    tags
                },
            )
            .await
    }

    async fn assign_role(
        &self,
        content_id: Id,
        role_id: Id,
        limitation: Option<BTreeMap<String, Vec<String>>>,
    ) -> HandlerResult<()> {
        self.core
            .mutate(
                InnerCall::new(
                    "user::assign_role",
                    json!({ "content": content_id, "role": role_id, "limitation": limitation }),
                ),
                self.inner.assign_role(content_id, role_id, limitation),
                |_| {
                    vec![
                        self.core
                            .tag(TagKind::RoleAssignmentGroupList, &[content_id.into()]),
                        self.core
                            .tag(TagKind::RoleAssignmentRoleList, &[role_id.into()]),
                        self.inherited_tag(),
                    ]
                },
            )
            .await
    }

    async fn remove_role_assignment(&self, role_assignment_id: Id) -> HandlerResult<()> {
        let assignment = self.load_role_assignment(role_assignment_id).await?;

        self.core
            .mutate(
                InnerCall::new(
                    "user::remove_role_assignment",
                    json!({ "role_assignment": role_assignment_id }),
                ),
                self.inner.remove_role_assignment(role_assignment_id),
                |_| {
                    let mut tags = self.assignment_tags(&assignment);
                    tags.push(self.inherited_tag());
                    tags
                },
            )
            .await
    }
}
