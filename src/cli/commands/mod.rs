pub(super) mod add;
pub(super) mod channels;
pub(super) mod init;
pub(super) mod is_owner;
pub(super) mod list;
pub(super) mod remove;
pub(super) mod resolve;
