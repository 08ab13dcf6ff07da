// Prompt templates.
// `{name}` placeholders are filled from the parameters passed to the agent.

pub const FIND_CONTACTS: &str = "\
I am trying to find the people responsible for transport policy on a website.
If they are found, they should be saved.
Usually there are several people on a site and they belong to one party.
If you have found the right website, then I would like to have exactly one person from each party.
Here is the url: {url}";

pub const UPDATE_CONTACT: &str = "\
I am trying to find information about this person on a website.
When you have found the information, you want it to be saved.
Here is the person: {person} and the url: {contact_url}";

/// Substitute `{key}` placeholders. Unknown placeholders are left as they are.
pub fn render(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{}}}", key), value)
        })
}
