// Domain layer: value objects, static carrier data and the collaborator ports.

pub mod data;
pub mod model;
pub mod ports;
pub mod posting_list;

#[cfg(test)]
pub(crate) mod test_support;
