use crate::verdict::Verdict;
use http_msgsig::{params::parse, Component, SignatureParams};
use owo_colors::{OwoColorize, Stream};

fn print_params(id: &str, params: &SignatureParams) {
    println!(
        "{}",
        id.if_supports_color(Stream::Stdout, |text| text.bold())
    );

    let components = params
        .components
        .iter()
        .map(Component::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    println!("  components: {components}");
    println!("  key ID:     {}", params.key_id);

    if let Some(algorithm) = params.declared_algorithm() {
        println!("  algorithm:  {algorithm}");
    }
    if let Some(created) = params.created {
        println!("  created:    {created}");
    }
    if let Some(expires) = params.expires {
        println!("  expires:    {expires}");
    }
    if let Some(ref nonce) = params.nonce {
        println!("  nonce:      {nonce}");
    }
    if let Some(ref tag) = params.tag {
        println!("  tag:        {tag}");
    }
}

pub fn do_it(header: &str) -> miette::Result<()> {
    let report = |error: parse::ParseError| {
        miette::Error::new(error)
            .with_source_code(header.to_string())
            .wrap_err(Verdict::Fail("Invalid Signature-Input header").to_string())
    };

    let members = parse::members(header).map_err(report)?;
    for member in members {
        let params = parse::params(member.value)
            .map_err(|error| report(error.offset_by(member.offset)))?;

        print_params(member.id, &params);
    }

    println!("{}", Verdict::Pass("Header is valid!"));

    Ok(())
}
