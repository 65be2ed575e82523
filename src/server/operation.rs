use crate::identity::AuthRequirement;

/// RPC operations exposed by the directory. Each carries its own route and
/// authorization requirement, so the router never inspects method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Login,
    ReadSelf,
    UpdateSelf,
    DeleteSelf,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Register,
        Operation::Login,
        Operation::ReadSelf,
        Operation::UpdateSelf,
        Operation::DeleteSelf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Register => "Register",
            Operation::Login => "Login",
            Operation::ReadSelf => "ReadSelf",
            Operation::UpdateSelf => "UpdateSelf",
            Operation::DeleteSelf => "DeleteSelf",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Operation::Register => "/rpc/Register",
            Operation::Login => "/rpc/Login",
            Operation::ReadSelf => "/rpc/ReadSelf",
            Operation::UpdateSelf => "/rpc/UpdateSelf",
            Operation::DeleteSelf => "/rpc/DeleteSelf",
        }
    }

    pub fn auth(self) -> AuthRequirement {
        match self {
            Operation::Register | Operation::Login => AuthRequirement::Public,
            Operation::ReadSelf | Operation::UpdateSelf | Operation::DeleteSelf => AuthRequirement::Bearer,
        }
    }
}
