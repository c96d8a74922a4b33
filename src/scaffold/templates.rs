//! Tera sources of the scaffold sections
//!
//! Section names and a few text anchors (`if *dbg {` block in `server-main`,
//! the logger adapter block, handler initialization in `server-init`, method
//! signatures in `basic-endpoint`) are what the built-in plugins rewrite.

// service.go

pub const SERVICE_T: &str = r#"
{% if description %}{{ description | comment }}
{% endif -%}
type Service interface {
{%- for m in methods %}
{%- if m.description %}
	{{ m.description | comment }}
{%- endif %}
	{{ m.var_name }}(context.Context{% if m.payload_ref %}, {{ m.payload_ref }}{% endif %}) ({% if m.result_ref %}res {{ m.result_ref }}, {% endif %}err error)
{%- endfor %}
}
"#;

pub const SERVICE_NAME_T: &str = r#"
// ServiceName is the name of the service as defined in the design.
const ServiceName = "{{ name }}"

// MethodNames lists the service method names as defined in the design.
var MethodNames = [{{ methods | length }}]string{ {%- for m in methods %}"{{ m.name }}"{% if not loop.last %}, {% endif %}{% endfor -%} }
"#;

pub const USER_TYPE_T: &str = r#"
// {{ name }} is a type of the "{{ service_name }}" service.
type {{ name }} struct {
{%- for f in fields %}
	{{ f.var_name }} {{ f.go_type }}
{%- endfor %}
}
"#;

// endpoints.go

pub const ENDPOINTS_STRUCT_T: &str = r#"
// Endpoints wraps the "{{ name }}" service endpoints.
type Endpoints struct {
{%- for m in methods %}
	{{ m.var_name }} goa.Endpoint
{%- endfor %}
}
"#;

pub const ENDPOINTS_INIT_T: &str = r#"
// NewEndpoints wraps the methods of the "{{ name }}" service with endpoints.
func NewEndpoints(s Service) *Endpoints {
	return &Endpoints{
{%- for m in methods %}
		{{ m.var_name }}: New{{ m.var_name }}Endpoint(s),
{%- endfor %}
	}
}
"#;

pub const ENDPOINTS_USE_T: &str = r#"
// Use applies the given middleware to all the "{{ name }}" service endpoints.
func (e *Endpoints) Use(m func(goa.Endpoint) goa.Endpoint) {
{%- for m in methods %}
	e.{{ m.var_name }} = m(e.{{ m.var_name }})
{%- endfor %}
}
"#;

pub const ENDPOINT_METHOD_T: &str = r#"
// New{{ var_name }}Endpoint returns an endpoint function that calls the
// method "{{ name }}" of service "{{ service_name }}".
func New{{ var_name }}Endpoint(s Service) goa.Endpoint {
	return func(ctx context.Context, req any) (any, error) {
{%- if payload_ref %}
		p := req.({{ payload_ref }})
{%- endif %}
{%- if result_ref %}
		return s.{{ var_name }}(ctx{% if payload_ref %}, p{% endif %})
{%- else %}
		return nil, s.{{ var_name }}(ctx{% if payload_ref %}, p{% endif %})
{%- endif %}
	}
}
"#;

// client.go

pub const CLIENT_STRUCT_T: &str = r#"
// Client is the "{{ name }}" service client.
type Client struct {
{%- for m in methods %}
	{{ m.var_name }}Endpoint goa.Endpoint
{%- endfor %}
}
"#;

pub const CLIENT_INIT_T: &str = r#"
// NewClient initializes a "{{ name }}" service client given the endpoints.
func NewClient({% for m in methods %}{{ m.name | camel_case }} goa.Endpoint{% if not loop.last %}, {% endif %}{% endfor %}) *Client {
	return &Client{
{%- for m in methods %}
		{{ m.var_name }}Endpoint: {{ m.name | camel_case }},
{%- endfor %}
	}
}
"#;

pub const CLIENT_METHOD_T: &str = r#"
// {{ var_name }} calls the "{{ name }}" endpoint of the "{{ service_name }}" service.
func (c *Client) {{ var_name }}(ctx context.Context{% if payload_ref %}, p {{ payload_ref }}{% endif %}) ({% if result_ref %}res {{ result_ref }}, {% endif %}err error) {
{%- if result_ref %}
	var ires any
	ires, err = c.{{ var_name }}Endpoint(ctx, {% if payload_ref %}p{% else %}nil{% endif %})
	if err != nil {
		return
	}
	return ires.({{ result_ref }}), nil
{%- else %}
	_, err = c.{{ var_name }}Endpoint(ctx, {% if payload_ref %}p{% else %}nil{% endif %})
	return
{%- endif %}
}
"#;

// gen/http/<service>/server/server.go

pub const SERVER_STRUCT_T: &str = r#"
// Server lists the {{ service_name }} service endpoint HTTP handlers.
type Server struct {
	Mounts []*MountPoint
{%- for e in endpoints %}
	{{ e.method.var_name }} http.Handler
{%- endfor %}
}

// MountPoint holds information about the mounted endpoints.
type MountPoint struct {
	// Method is the name of the service method served by the mounted HTTP handler.
	Method string
	// Verb is the HTTP method used to match requests to the mounted handler.
	Verb string
	// Pattern is the HTTP request path pattern used to match requests to the
	// mounted handler.
	Pattern string
}
"#;

pub const SERVER_INIT_T: &str = r#"
// New instantiates HTTP handlers for all the {{ service_name }} service endpoints.
func New(
	e *{{ pkg }}.Endpoints,
	mux goahttp.Muxer,
	dec func(*http.Request) goahttp.Decoder,
	enc func(context.Context, http.ResponseWriter) goahttp.Encoder,
	eh func(context.Context, http.ResponseWriter, error),
) *Server {
	return &Server{
		Mounts: []*MountPoint{
{%- for e in endpoints %}{% for r in e.routes %}
			{"{{ e.method.var_name }}", "{{ r.verb }}", "{{ r.path }}"},
{%- endfor %}{% endfor %}
		},
{%- for e in endpoints %}
		{{ e.method.var_name }}: {{ e.handler_init }}(e.{{ e.method.var_name }}, mux, dec, enc, eh),
{%- endfor %}
	}
}
"#;

pub const SERVER_SERVICE_T: &str = r#"
// Service returns the name of the service served.
func (s *Server) Service() string { return "{{ service_name }}" }
"#;

pub const SERVER_MOUNT_T: &str = r#"
// Mount configures the mux to serve the {{ service_name }} endpoints.
func Mount(mux goahttp.Muxer, h *Server) {
{%- for e in endpoints %}
	Mount{{ e.method.var_name }}Handler(mux, h.{{ e.method.var_name }})
{%- endfor %}
}
"#;

pub const SERVER_HANDLER_T: &str = r#"
// Mount{{ method.var_name }}Handler configures the mux to serve the "{{ service_name }}"
// service "{{ method.name }}" endpoint.
func Mount{{ method.var_name }}Handler(mux goahttp.Muxer, h http.Handler) {
	f, ok := h.(http.HandlerFunc)
	if !ok {
		f = func(w http.ResponseWriter, r *http.Request) {
			h.ServeHTTP(w, r)
		}
	}
{%- for r in routes %}
	mux.Handle("{{ r.verb }}", "{{ r.path }}", f)
{%- endfor %}
}
"#;

pub const SERVER_HANDLER_INIT_T: &str = r#"
// {{ handler_init }} creates a HTTP handler which loads the HTTP request and
// calls the "{{ service_name }}" service "{{ method.name }}" endpoint.
func {{ handler_init }}(
	endpoint goa.Endpoint,
	mux goahttp.Muxer,
	dec func(*http.Request) goahttp.Decoder,
	enc func(context.Context, http.ResponseWriter) goahttp.Encoder,
	eh func(context.Context, http.ResponseWriter, error),
) http.Handler {
	var (
{%- if method.payload_ref %}
		decodeRequest  = {{ request_decoder }}(mux, dec)
{%- endif %}
		encodeResponse = {{ response_encoder }}(enc)
		encodeError    = goahttp.ErrorEncoder(enc, nil)
	)
	return http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {
		ctx := context.WithValue(r.Context(), goahttp.AcceptTypeKey, r.Header.Get("Accept"))
		ctx = context.WithValue(ctx, goa.MethodKey, "{{ method.name }}")
		ctx = context.WithValue(ctx, goa.ServiceKey, "{{ service_name }}")
{%- if method.payload_ref %}
		payload, err := decodeRequest(r)
		if err != nil {
			eh(ctx, w, err)
			return
		}
		res, err := endpoint(ctx, payload)
{%- else %}
		res, err := endpoint(ctx, nil)
{%- endif %}
		if err != nil {
			if err := encodeError(ctx, w, err); err != nil {
				eh(ctx, w, err)
			}
			return
		}
		if err := encodeResponse(ctx, w, res); err != nil {
			eh(ctx, w, err)
		}
	})
}
"#;

// gen/http/<service>/server/encode_decode.go

pub const RESPONSE_ENCODER_T: &str = r#"
// {{ response_encoder }} returns an encoder for responses returned by the
// {{ service_name }} {{ method.name }} endpoint.
func {{ response_encoder }}(encoder func(context.Context, http.ResponseWriter) goahttp.Encoder) func(context.Context, http.ResponseWriter, any) error {
	return func(ctx context.Context, w http.ResponseWriter, v any) error {
{%- if method.result_ref %}
		res, _ := v.({{ method.result_ref }})
		enc := encoder(ctx, w)
		w.WriteHeader({{ status }})
		return enc.Encode(res)
{%- else %}
		w.WriteHeader({{ status }})
		return nil
{%- endif %}
	}
}
"#;

pub const REQUEST_DECODER_T: &str = r#"
// {{ request_decoder }} returns a decoder for requests sent to the
// {{ service_name }} {{ method.name }} endpoint.
func {{ request_decoder }}(mux goahttp.Muxer, decoder func(*http.Request) goahttp.Decoder) func(*http.Request) (any, error) {
	return func(r *http.Request) (any, error) {
		var body {{ method.payload_type }}
		if err := decoder(r).Decode(&body); err != nil {
			return nil, goa.DecodePayloadError(err.Error())
		}
		return {% if method.payload_pointer %}&body{% else %}body{% endif %}, nil
	}
}
"#;

// cmd/<server>/main.go

pub const SERVER_MAIN_T: &str = r#"
func main() {
	// Define command line flags, add any other flag required to configure
	// the service.
	var (
		addrF = flag.String("http-addr", "{{ addr }}", "HTTP listen address")
		dbg   = flag.Bool("debug", false, "Log request and response bodies")
	)
	flag.Parse()

	// Setup logger and goa log adapter.
	var (
		logger  *log.Logger
		adapter middleware.Logger
	)
	{
		logger = log.New(os.Stderr, "[{{ api_pkg }}] ", log.Ltime)
		adapter = middleware.NewLogger(logger)
	}

	// Create the structs that implement the services.
	var (
{%- for s in services %}
		{{ s.camel }}Svc {{ s.pkg }}svc.Service
{%- endfor %}
	)
	{
{%- for s in services %}
		{{ s.camel }}Svc = {{ api_pkg }}.New{{ s.var_name }}(logger)
{%- endfor %}
	}

	// Wrap the services in endpoints that can be invoked from other
	// services potentially running in different processes.
	var (
{%- for s in services %}
		{{ s.camel }}Endpoints *{{ s.pkg }}svc.Endpoints
{%- endfor %}
	)
	{
{%- for s in services %}
		{{ s.camel }}Endpoints = {{ s.pkg }}svc.NewEndpoints({{ s.camel }}Svc)
{%- endfor %}
	}

	// Build the service HTTP request multiplexer and configure it to serve
	// HTTP requests to the service endpoints.
	var (
		dec = goahttp.RequestDecoder
		enc = goahttp.ResponseEncoder
		mux = goahttp.NewMuxer()
	)
	{
		eh := errorHandler(logger)
{%- for s in services %}
		{{ s.pkg }}svr.Mount(mux, {{ s.pkg }}svr.New({{ s.camel }}Endpoints, mux, dec, enc, eh))
{%- endfor %}
	}

	// Wrap the multiplexer with additional middlewares.
	var handler http.Handler = mux
	{
		if *dbg {
			handler = middleware.Debug(mux, os.Stdout)(handler)
		}
		handler = middleware.Log(adapter)(handler)
		handler = middleware.RequestID()(handler)
	}

	// Create channel used by both the signal handler and server goroutines
	// to notify the main goroutine when to stop the server.
	errc := make(chan error)

	go func() {
		c := make(chan os.Signal, 1)
		signal.Notify(c, syscall.SIGINT, syscall.SIGTERM)
		errc <- fmt.Errorf("%s", <-c)
	}()

	srv := &http.Server{Addr: *addrF, Handler: handler}
	go func() {
		logger.Printf("HTTP server listening on %q", *addrF)
		errc <- srv.ListenAndServe()
	}()

	logger.Printf("exiting (%v)", <-errc)

	ctx, cancel := context.WithTimeout(context.Background(), 5*time.Second)
	defer cancel()
	srv.Shutdown(ctx)
	logger.Println("exited")
}
"#;

pub const ERROR_HANDLER_T: &str = r#"
// errorHandler returns a function that writes and logs the given error.
func errorHandler(logger *log.Logger) func(context.Context, http.ResponseWriter, error) {
	return func(ctx context.Context, w http.ResponseWriter, err error) {
		id, _ := ctx.Value(middleware.RequestIDKey).(string)
		_, _ = w.Write([]byte("[" + id + "] encoding: " + err.Error()))
		logger.Printf("[%s] ERROR: %s", id, err.Error())
	}
}
"#;

// <service>.go and auth.go

pub const BASIC_SERVICE_STRUCT_T: &str = r#"
// {{ name }} service example implementation.
// The example methods log the requests and return zero values.
type {{ camel }}Svc struct {
	logger *log.Logger
}

// New{{ var_name }} returns the {{ name }} service implementation.
func New{{ var_name }}(logger *log.Logger) {{ pkg }}svc.Service {
	return &{{ camel }}Svc{logger}
}
"#;

pub const BASIC_ENDPOINT_T: &str = r#"
// {{ method.var_name }} implements {{ method.name }}.
func (s *{{ service.camel }}Svc) {{ method.var_name }}(ctx context.Context{% if method.payload_ref %}, p {{ method.payload_ref }}{% endif %}) ({% if method.result_ref %}res {{ method.result_ref }}, {% endif %}err error) {
	s.logger.Print("{{ service.name }}.{{ method.name }}")
	return
}
"#;

pub const AUTH_FUNC_T: &str = r#"
// {{ scheme.type }}Auth implements the authorization logic for service
// "{{ service.name }}" for the "{{ scheme.name }}" security scheme.
func (s *{{ service.camel }}Svc) {{ scheme.type }}Auth(ctx context.Context, {% if scheme.type == "Basic" %}user, pass{% elif scheme.type == "APIKey" %}key{% else %}token{% endif %} string, scheme *security.{{ scheme.type }}Scheme) (context.Context, error) {
	return ctx, fmt.Errorf("not implemented")
}
"#;
