pub mod vt_server;
