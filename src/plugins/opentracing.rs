//! OpenTracing middleware and example instrumentation

use tracing::debug;

use crate::codegen::utils::import_path;
use crate::codegen::{
    File, FileSet, ImportSpec, PatchMode, RegexPatch, Section, add_import, header, patch_file,
};
use crate::core::error::Result;
use crate::design::{Root, http_roots};
use crate::plugin::{GenContext, Plugin};
use crate::plugins::DEBUG_BLOCK;
use crate::scaffold;

pub const NAME: &str = "opentracing";

pub const MIDDLEWARE_PATH: &str = "gen/tracing/opentracing.go";

const OPENTRACING: &str = "github.com/opentracing/opentracing-go";

/// End of an example method signature
const METHOD_SIGNATURE: &str =
    r"\(\{% if method\.result_ref %\}res \{\{ method\.result_ref \}\}, \{% endif %\}err error\) \{";

/// End of an example auth function signature
const AUTH_SIGNATURE: &str = r"\*security\.\{\{ scheme\.type \}\}Scheme\) \(context\.Context, error\) \{";

const METHOD_SPAN_T: &str = r#"
	span, _ := opentracing.StartSpanFromContext(ctx, "{{ service.name }}.{{ method.var_name }}")
	defer span.Finish()"#;

const AUTH_SPAN_T: &str = r#"
	span, _ := opentracing.StartSpanFromContext(ctx, "{{ service.name }}.{{ scheme.type }}Auth")
	defer span.Finish()"#;

/// Adds the tracing middleware package (`gen` hook)
pub struct OpenTracing;

/// Wires the middleware into the example server and starts spans in the
/// example methods (`example` hook)
pub struct OpenTracingExample;

/// File holding the HTTP tracing middleware
pub fn middleware_file() -> File {
    File::new(
        MIDDLEWARE_PATH,
        vec![
            header(
                "Opentracing Middleware",
                "tracing",
                vec![
                    ImportSpec::new("net/http"),
                    ImportSpec::aliased("opentracing", OPENTRACING),
                    ImportSpec::aliased("ext", format!("{OPENTRACING}/ext")),
                    ImportSpec::new("goa.design/goa/v3/http/middleware"),
                ],
            ),
            Section::new("opentracing-middleware", MIDDLEWARE_T),
        ],
    )
}

impl Plugin for OpenTracing {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, _ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        if http_roots(roots).next().is_some() {
            files.push(middleware_file())?;
        }
        Ok(files)
    }
}

impl OpenTracingExample {
    fn update_main(&self, ctx: &GenContext, file: &mut File) -> Result<()> {
        let locator = ctx.locator();
        if let Some(header) = locator.header_mut(file)? {
            add_import(
                header,
                &ImportSpec::aliased("tracing", import_path(ctx.genpkg(), &["tracing"])),
            );
        }
        let patch = RegexPatch::new(
            DEBUG_BLOCK,
            "\thandler = tracing.OpenTracing()(handler)\n\t",
            PatchMode::InsertAfterFirst,
        )?;
        patch_file(file, &patch, ctx.strictness())?;
        Ok(())
    }

    fn update_implementation(&self, ctx: &GenContext, file: &mut File, patch: &RegexPatch) -> Result<()> {
        let locator = ctx.locator();
        if let Some(header) = locator.header_mut(file)? {
            add_import(header, &ImportSpec::aliased("opentracing", OPENTRACING));
        }
        patch_file(file, patch, ctx.strictness())?;
        Ok(())
    }
}

impl Plugin for OpenTracingExample {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        let locator = ctx.locator();
        let method_span = RegexPatch::new(METHOD_SIGNATURE, METHOD_SPAN_T, PatchMode::InsertAfterFirst)?;
        let auth_span = RegexPatch::new(AUTH_SIGNATURE, AUTH_SPAN_T, PatchMode::InsertAfterFirst)?;

        for root in http_roots(roots) {
            for server in root.servers() {
                if let Some(file) = locator.file_mut(&mut files, &scaffold::main_path(&server.name))? {
                    self.update_main(ctx, file)?;
                }
            }

            // Files without methods or auth functions carry no signature to anchor on
            for service in root.services.iter().filter(|s| !s.methods.is_empty()) {
                let path = scaffold::impl_path(&service.name);
                if let Some(file) = locator.file_mut(&mut files, &path)? {
                    self.update_implementation(ctx, file, &method_span)?;
                    debug!(path = %path, "Traced service methods");
                }
            }

            if !root.schemes.is_empty() && !root.services.is_empty() {
                if let Some(file) = locator.file_mut(&mut files, scaffold::AUTH_PATH)? {
                    self.update_implementation(ctx, file, &auth_span)?;
                }
            }
        }
        Ok(files)
    }
}

const MIDDLEWARE_T: &str = r#"
// OpenTracing returns a middleware that traces HTTP requests using the
// globally defined opentracing tracer.
func OpenTracing() func(h http.Handler) http.Handler {
	return func(h http.Handler) http.Handler {
		return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
			wireCtx, _ := opentracing.GlobalTracer().Extract(
				opentracing.HTTPHeaders,
				opentracing.HTTPHeadersCarrier(r.Header))

			serverSpan := opentracing.StartSpan(r.URL.Path, ext.RPCServerOption(wireCtx))
			defer serverSpan.Finish()

			r = r.WithContext(opentracing.ContextWithSpan(r.Context(), serverSpan))

			rw := middleware.CaptureResponse(w)
			h.ServeHTTP(rw, r)
		})
	}
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{Strictness, imports};
    use crate::design::HttpRoot;
    use crate::plugin::PrimaryGenerator;
    use crate::render::{TemplateRenderer, TeraRenderer};
    use crate::scaffold::ScaffoldGenerator;

    const DESIGN: &str = r#"
api:
  name: calc
services:
  - name: calc
    methods:
      - name: add
        payload:
          type: AddPayload
          fields: [{ name: a, type: Int, required: true }]
        result: { type: Int }
      - name: reset
schemes:
  - { name: jwt, type: JWT }
"#;

    fn example_files(roots: &[Root]) -> FileSet {
        ScaffoldGenerator::for_hook("example")
            .generate("calc/gen", roots)
            .unwrap()
    }

    #[test]
    fn test_gen_adds_middleware_file() {
        let roots = vec![Root::Http(HttpRoot::from_yaml(DESIGN).unwrap())];
        let ctx = GenContext::new("calc/gen");
        let files = OpenTracing.generate(&ctx, &roots, FileSet::new()).unwrap();
        assert_eq!(files.paths(), vec![MIDDLEWARE_PATH]);

        let rendered = TeraRenderer::new().render_file(files.get(MIDDLEWARE_PATH).unwrap()).unwrap();
        assert!(rendered.content.contains("package tracing"));
        assert!(rendered.content.contains("func OpenTracing() func(h http.Handler) http.Handler"));
    }

    #[test]
    fn test_example_instruments_main_methods_and_auth() {
        let roots = vec![Root::Http(HttpRoot::from_yaml(DESIGN).unwrap())];
        let ctx = GenContext::new("calc/gen").with_strictness(Strictness::Strict);
        let files = OpenTracingExample
            .generate(&ctx, &roots, example_files(&roots))
            .unwrap();

        let main = files.get("cmd/calc/main.go").unwrap();
        assert!(imports::imports(main.header().unwrap())
            .contains(&ImportSpec::aliased("tracing", "calc/gen/tracing")));

        let renderer = TeraRenderer::new();
        let main = renderer.render_file(main).unwrap().content;
        let debug = main.find("handler = middleware.Debug(mux, os.Stdout)(handler)").unwrap();
        let traced = main.find("handler = tracing.OpenTracing()(handler)").unwrap();
        assert!(debug < traced);
        assert!(main.contains("\t\thandler = tracing.OpenTracing()(handler)\n\t}"));

        let service = renderer.render_file(files.get("calc.go").unwrap()).unwrap().content;
        assert!(service.contains("opentracing \"github.com/opentracing/opentracing-go\""));
        assert!(service.contains(
            "(res int, err error) {\n\tspan, _ := opentracing.StartSpanFromContext(ctx, \"calc.Add\")"
        ));
        assert!(service.contains(
            "Reset(ctx context.Context) (err error) {\n\tspan, _ := opentracing.StartSpanFromContext(ctx, \"calc.Reset\")"
        ));

        let auth = renderer.render_file(files.get("auth.go").unwrap()).unwrap().content;
        assert!(auth.contains("StartSpanFromContext(ctx, \"calc.JWTAuth\")"));
    }

    #[test]
    fn test_strict_example_skips_services_without_methods() {
        let design = r#"
api:
  name: calc
services:
  - name: calc
    methods:
      - name: add
        result: { type: Int }
  - name: health
"#;
        let roots = vec![Root::Http(HttpRoot::from_yaml(design).unwrap())];
        let ctx = GenContext::new("calc/gen").with_strictness(Strictness::Strict);
        let files = OpenTracingExample
            .generate(&ctx, &roots, example_files(&roots))
            .unwrap();

        let health = TeraRenderer::new().render_file(files.get("health.go").unwrap()).unwrap().content;
        assert!(!health.contains("opentracing"));
        let calc = TeraRenderer::new().render_file(files.get("calc.go").unwrap()).unwrap().content;
        assert!(calc.contains("StartSpanFromContext(ctx, \"calc.Add\")"));
    }

    #[test]
    fn test_strict_example_skips_auth_without_services() {
        let design = "api:\n  name: calc\nschemes:\n  - { name: jwt, type: JWT }\n";
        let roots = vec![Root::Http(HttpRoot::from_yaml(design).unwrap())];
        let ctx = GenContext::new("calc/gen").with_strictness(Strictness::Strict);
        let files = example_files(&roots);
        let before = files.clone();
        let files = OpenTracingExample.generate(&ctx, &roots, files).unwrap();
        assert_eq!(files.get("auth.go"), before.get("auth.go"));
    }

    #[test]
    fn test_example_without_files_is_a_no_op() {
        let roots = vec![Root::Http(HttpRoot::from_yaml(DESIGN).unwrap())];
        let files = OpenTracingExample
            .generate(&GenContext::new("calc/gen"), &roots, FileSet::new())
            .unwrap();
        assert!(files.is_empty());
    }
}
