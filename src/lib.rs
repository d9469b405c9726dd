pub mod ber;
pub mod ldap;
