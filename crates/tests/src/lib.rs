
#[cfg(test)]
mod access_rules_tests;
#[cfg(test)]
mod auth_tests;
#[cfg(test)]
mod organization_tests;
#[cfg(test)]
mod invitation_tests;
