mod deploy_error;

pub use deploy_error::DeployError;
