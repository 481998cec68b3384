pub mod following;
