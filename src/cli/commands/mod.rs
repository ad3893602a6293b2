pub mod seed;
pub mod superuser;
