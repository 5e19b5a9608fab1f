pub mod id_resolver;
